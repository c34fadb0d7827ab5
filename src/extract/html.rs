//! Server-rendered HTML to [`PageContent`].
//!
//! A tolerant tag scanner, not a DOM: it finds `<table>` blocks and their
//! rows and cells, and renders visible text with one line per block
//! element. Tag and attribute names are matched case-insensitively on
//! ASCII. Nested tables are not supported.

use super::page::{PageContent, PageTable};

/// Location of one element inside the source string.
#[derive(Debug, Clone, Copy)]
struct Element {
    start: usize,
    inner_start: usize,
    inner_end: usize,
    end: usize,
}

/// Builds page content from an HTML document.
#[must_use]
pub fn page_from_html(html: &str) -> PageContent {
    let body = element_inner(html, "body").unwrap_or(html);
    let cleaned = remove_elements(&remove_elements(body, "script"), "style");
    PageContent {
        text: visible_text(&cleaned),
        tables: tables(&cleaned),
    }
}

/// Finds the next `<tag ...>...</tag>` at or after `from`.
fn next_element(lc: &str, tag: &str, from: usize) -> Option<Element> {
    let open = format!("<{tag}");
    let close = format!("</{tag}");
    let mut search = from;
    let start = loop {
        let pos = lc.get(search..)?.find(&open)? + search;
        let after = lc.get(pos + open.len()..)?.chars().next()?;
        if after == '>' || after == '/' || after.is_ascii_whitespace() {
            break pos;
        }
        search = pos + open.len();
    };
    let inner_start = lc.get(start..)?.find('>')? + start + 1;
    let inner_end = lc.get(inner_start..)?.find(&close)? + inner_start;
    let end = lc.get(inner_end..)?.find('>').map_or(lc.len(), |i| inner_end + i + 1);
    Some(Element {
        start,
        inner_start,
        inner_end,
        end,
    })
}

/// Iterates over all top-level `tag` elements of `src`.
fn elements<'a>(src: &str, tag: &'a str) -> impl Iterator<Item = Element> + 'a {
    let lc = src.to_ascii_lowercase();
    let mut pos = 0;
    std::iter::from_fn(move || {
        let el = next_element(&lc, tag, pos)?;
        pos = el.end;
        Some(el)
    })
}

fn inner<'a>(src: &'a str, el: Element) -> &'a str {
    src.get(el.inner_start..el.inner_end).unwrap_or_default()
}

fn element_inner<'a>(src: &'a str, tag: &str) -> Option<&'a str> {
    let el = elements(src, tag).next()?;
    src.get(el.inner_start..el.inner_end)
}

fn remove_elements(src: &str, tag: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut last = 0;
    for el in elements(src, tag) {
        out.push_str(src.get(last..el.start).unwrap_or_default());
        last = el.end;
    }
    out.push_str(src.get(last..).unwrap_or_default());
    out
}

/// Tags that end a rendered line.
const LINE_BREAKING: &[&str] = &[
    "br", "p", "div", "tr", "li", "ul", "ol", "table", "thead", "tbody", "section", "header",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// Renders markup as text: block tags become line breaks, cells become
/// tabs, everything else is dropped.
fn render(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut chars = fragment.chars();
    while let Some(ch) = chars.next() {
        if ch != '<' {
            out.push(ch);
            continue;
        }
        let tag: String = chars.by_ref().take_while(|&c| c != '>').collect();
        let name: String = tag
            .trim_start_matches('/')
            .chars()
            .take_while(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();
        if name == "td" || name == "th" {
            out.push('\t');
        } else if LINE_BREAKING.contains(&name.as_str()) {
            out.push('\n');
        }
    }
    decode_entities(&out)
}

/// Minimal entity decoding for the entities dashboards actually emit.
fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Collapses runs of whitespace into one space and trims.
fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn visible_text(fragment: &str) -> String {
    render(fragment)
        .lines()
        .map(|line| normalize_ws(&line.replace('\t', " ")))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn cell_texts(row: &str) -> Vec<String> {
    elements(row, "td")
        .map(|el| normalize_ws(&render(inner(row, el))))
        .collect()
}

fn tables(fragment: &str) -> Vec<PageTable> {
    elements(fragment, "table")
        .map(|el| {
            let table = inner(fragment, el);
            let header_text = element_inner(table, "thead")
                .map(|h| normalize_ws(&render(h)))
                .unwrap_or_default();
            let body = element_inner(table, "tbody").unwrap_or(table);
            let rows: Vec<Vec<String>> = elements(body, "tr")
                .map(|tr| cell_texts(inner(body, tr)))
                .filter(|cells| !cells.is_empty())
                .collect();
            let body_text = normalize_ws(&render(body));
            PageTable {
                header_text,
                body_text,
                rows,
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><head><title>Observer</title><style>.x{color:red}</style></head>
<BODY>
  <div class="card"><span>Online workers</span><div>42</div></div>
  <div class="card"><span>Offline workers</span><div>7</div></div>
  <script>var a = "<table>";</script>
  <table class="workers">
    <thead><tr><th>Воркеры</th><th>Статус</th></tr></thead>
    <tbody>
      <TR><td>Rig&nbsp;01</td><td><b>ONLINE</b></td><td>100 TH/s</td><td>99 TH/s</td><td>98 TH/s</td><td>12:01</td></TR>
      <tr><td>Rig 02</td><td>OFFLINE</td><td>0</td><td>0</td><td>0</td></tr>
    </tbody>
  </table>
  <table><thead><tr><th>Дата</th></tr></thead>
    <tbody><tr><td>12/3/2025</td><td>0.001 BTC</td><td>100 TH/s</td></tr></tbody>
  </table>
</BODY></html>"#;

    #[test]
    fn text_has_one_line_per_block() {
        let page = page_from_html(PAGE);
        let lines: Vec<&str> = page.text.lines().collect();
        assert!(lines.windows(2).any(|w| w == ["Online workers", "42"]));
        assert!(lines.windows(2).any(|w| w == ["Offline workers", "7"]));
        assert!(!page.text.contains("color:red"));
        assert!(!page.text.contains("var a"));
    }

    #[test]
    fn tables_keep_header_and_cells() {
        let page = page_from_html(PAGE);
        assert_eq!(page.tables.len(), 2);
        let Some(workers) = page.tables.first() else {
            panic!("missing worker table");
        };
        assert!(workers.header_text.contains("Воркеры"));
        assert_eq!(workers.rows.len(), 2);
        assert_eq!(
            workers.rows.first().cloned().unwrap_or_default(),
            vec!["Rig 01", "ONLINE", "100 TH/s", "99 TH/s", "98 TH/s", "12:01"]
        );
        assert!(workers.body_text.contains("OFFLINE"));
    }

    #[test]
    fn thead_is_not_mistaken_for_th() {
        let lc = "<thead><th>x</th></thead>";
        let Some(el) = next_element(lc, "th", 0) else {
            panic!("th not found");
        };
        assert_eq!(inner(lc, el), "x");
    }
}
