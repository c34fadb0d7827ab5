//! Display-string normalization.
//!
//! The dashboard shows values with unit or currency suffixes
//! (`"12.5 PH/s"`, `"0.00123 BTC"`, `"42"`). These helpers turn them into
//! canonical numbers. None of them fail: unparsable text degrades to zero
//! (hashrate) or to `None` (currency, counts).

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Currency suffix stripped from balance and income strings.
pub const CURRENCY_SUFFIX: &str = "BTC";

/// Multiplier applied when the unit prefix is missing or unknown.
pub const DEFAULT_MULTIPLIER: f64 = 1.0;

#[allow(clippy::expect_used)]
static HASHRATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*([A-Za-z]?)H/s").expect("hashrate pattern is valid")
});

/// SI prefix of a hashrate unit, relative to TH/s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashUnit {
    /// PH/s, ×1000.
    Peta,
    /// TH/s, ×1.
    Tera,
    /// GH/s, ×0.001.
    Giga,
    /// MH/s, ×0.000001.
    Mega,
    /// Bare `H/s` or an unknown prefix such as `E` or `K`.
    Unrecognized,
}

impl HashUnit {
    fn from_prefix(prefix: &str) -> Self {
        match prefix {
            "P" => Self::Peta,
            "T" => Self::Tera,
            "G" => Self::Giga,
            "M" => Self::Mega,
            _ => Self::Unrecognized,
        }
    }

    /// Factor converting a value in this unit to TH/s.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Peta => 1000.0,
            Self::Tera => 1.0,
            Self::Giga => 0.001,
            Self::Mega => 0.000_001,
            Self::Unrecognized => DEFAULT_MULTIPLIER,
        }
    }
}

impl fmt::Display for HashUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Peta => "PH/s",
            Self::Tera => "TH/s",
            Self::Giga => "GH/s",
            Self::Mega => "MH/s",
            Self::Unrecognized => "?H/s",
        })
    }
}

/// A hashrate found inside a display string.
#[derive(Debug, Clone, PartialEq)]
pub struct Hashrate {
    /// Number as displayed.
    pub value: f64,
    /// Unit it was displayed in.
    pub unit: HashUnit,
    /// Unit prefix text as displayed (empty for bare `H/s`).
    pub raw_prefix: String,
}

impl Hashrate {
    /// Value converted to TH/s.
    #[must_use]
    pub fn ths(&self) -> f64 {
        self.value * self.unit.multiplier()
    }
}

/// Finds the first `<number> <prefix>H/s` token in `display`.
#[must_use]
pub fn parse_hashrate(display: &str) -> Option<Hashrate> {
    let caps = HASHRATE_RE.captures(display)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let raw_prefix = caps.get(2).map_or("", |m| m.as_str());
    Some(Hashrate {
        value,
        unit: HashUnit::from_prefix(raw_prefix),
        raw_prefix: raw_prefix.to_string(),
    })
}

/// Converts a hashrate display string to TH/s.
///
/// No match yields `0.0`. A missing or unknown unit prefix is treated as
/// TH/s and logged at `warn`, since the magnitude may be wrong.
#[must_use]
pub fn hashrate_to_ths(text: &str) -> f64 {
    let Some(hashrate) = parse_hashrate(text) else {
        return 0.0;
    };
    if hashrate.unit == HashUnit::Unrecognized {
        tracing::warn!(
            value = %text,
            prefix = %hashrate.raw_prefix,
            multiplier = DEFAULT_MULTIPLIER,
            "unrecognized hashrate unit, assuming TH/s"
        );
    }
    hashrate.ths()
}

/// Parses a currency display string such as `"0.00123 BTC"`.
///
/// Strips the currency suffix and parses the remainder. Returns `None`
/// for anything that is not a finite number.
#[must_use]
pub fn parse_btc(display: &str) -> Option<f64> {
    let cleaned = display.replace(CURRENCY_SUFFIX, "");
    let value: f64 = cleaned.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

/// Parses a worker count such as `"42"`.
#[must_use]
pub fn parse_count(display: &str) -> Option<u32> {
    display.trim().parse().ok()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn known_units_use_the_table() {
        for (prefix, mult) in [("P", 1000.0), ("T", 1.0), ("G", 0.001), ("M", 0.000_001)] {
            for v in [0.5, 1.0, 12.75, 340.0] {
                let display = format!("{v}{prefix}H/s");
                assert_eq!(hashrate_to_ths(&display), v * mult, "{display}");
            }
        }
    }

    #[test]
    fn unknown_units_default_to_one() {
        assert_eq!(hashrate_to_ths("5 EH/s"), 5.0);
        assert_eq!(hashrate_to_ths("7 H/s"), 7.0);
        let Some(h) = parse_hashrate("5 KH/s") else {
            panic!("expected a match");
        };
        assert_eq!(h.unit, HashUnit::Unrecognized);
        assert_eq!(h.raw_prefix, "K");
    }

    #[test]
    fn spacing_and_surrounding_text_are_tolerated() {
        assert_eq!(hashrate_to_ths("  12.5 PH/s  "), 12_500.0);
        assert_eq!(hashrate_to_ths("avg: 300 GH/s (24h)"), 300.0 * 0.001);
    }

    #[test]
    fn no_match_is_zero() {
        assert_eq!(hashrate_to_ths(""), 0.0);
        assert_eq!(hashrate_to_ths("n/a"), 0.0);
        assert_eq!(hashrate_to_ths("100 TH"), 0.0);
    }

    #[test]
    fn currency_strips_suffix() {
        assert_eq!(parse_btc("0.00123 BTC"), Some(0.00123));
        assert_eq!(parse_btc("1.5BTC"), Some(1.5));
        assert_eq!(parse_btc("2"), Some(2.0));
    }

    #[test]
    fn currency_failure_is_absent() {
        assert_eq!(parse_btc(""), None);
        assert_eq!(parse_btc("n/a BTC"), None);
        assert_eq!(parse_btc("NaN BTC"), None);
    }

    #[test]
    fn counts_are_trimmed() {
        assert_eq!(parse_count(" 42 "), Some(42));
        assert_eq!(parse_count("seven"), None);
        assert_eq!(parse_count("-1"), None);
    }
}
