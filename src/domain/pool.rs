//! Pool identity and descriptive metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PoolId;

/// Identity record of a monitored pool.
///
/// Created and updated by pool administration; the scrape pipeline only
/// reads it and uses `pool_id` as the foreign key for everything it writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PoolIdentity {
    /// Stable key.
    #[schema(value_type = String)]
    pub pool_id: PoolId,
    /// Display name.
    pub pool_name: String,
    /// Observer dashboard URL.
    pub observer_url: String,
    /// Client the pool belongs to.
    pub client_name: String,
    /// Country.
    pub country: String,
    /// Owning company.
    pub company: String,
    /// Physical location.
    pub location: String,
    /// Contact email.
    pub contact_email: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Whether the pool is scraped.
    pub active: bool,
}

/// A stored pool with its bookkeeping timestamps.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PoolRecord {
    /// Identity and metadata.
    #[serde(flatten)]
    pub identity: PoolIdentity,
    /// First registration time.
    pub created_at: DateTime<Utc>,
    /// Last metadata change.
    pub updated_at: DateTime<Utc>,
}

/// Partial metadata update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoolUpdate {
    /// New display name.
    pub pool_name: Option<String>,
    /// New observer URL.
    pub observer_url: Option<String>,
    /// New client name.
    pub client_name: Option<String>,
    /// New country.
    pub country: Option<String>,
    /// New company.
    pub company: Option<String>,
    /// New location.
    pub location: Option<String>,
    /// New contact email.
    pub contact_email: Option<String>,
    /// New tag list.
    pub tags: Option<Vec<String>>,
    /// New active flag.
    pub active: Option<bool>,
}

impl PoolUpdate {
    /// Returns `true` when no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool_name.is_none()
            && self.observer_url.is_none()
            && self.client_name.is_none()
            && self.country.is_none()
            && self.company.is_none()
            && self.location.is_none()
            && self.contact_email.is_none()
            && self.tags.is_none()
            && self.active.is_none()
    }

    /// Applies the update to an identity in place.
    pub fn apply(self, identity: &mut PoolIdentity) {
        let Self {
            pool_name,
            observer_url,
            client_name,
            country,
            company,
            location,
            contact_email,
            tags,
            active,
        } = self;
        if let Some(v) = pool_name {
            identity.pool_name = v;
        }
        if let Some(v) = observer_url {
            identity.observer_url = v;
        }
        if let Some(v) = client_name {
            identity.client_name = v;
        }
        if let Some(v) = country {
            identity.country = v;
        }
        if let Some(v) = company {
            identity.company = v;
        }
        if let Some(v) = location {
            identity.location = v;
        }
        if let Some(v) = contact_email {
            identity.contact_email = v;
        }
        if let Some(v) = tags {
            identity.tags = v;
        }
        if let Some(v) = active {
            identity.active = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> PoolIdentity {
        PoolIdentity {
            pool_id: PoolId::new("kz-01"),
            pool_name: "Pool".to_string(),
            observer_url: String::new(),
            client_name: String::new(),
            country: "Kazakhstan".to_string(),
            company: String::new(),
            location: String::new(),
            contact_email: String::new(),
            tags: Vec::new(),
            active: true,
        }
    }

    #[test]
    fn empty_update_changes_nothing() {
        let update = PoolUpdate::default();
        assert!(update.is_empty());
        let mut id = identity();
        update.apply(&mut id);
        assert_eq!(id, identity());
    }

    #[test]
    fn partial_update_only_touches_given_fields() {
        let update = PoolUpdate {
            pool_name: Some("Renamed".to_string()),
            active: Some(false),
            ..PoolUpdate::default()
        };
        let mut id = identity();
        update.apply(&mut id);
        assert_eq!(id.pool_name, "Renamed");
        assert!(!id.active);
        assert_eq!(id.country, "Kazakhstan");
    }
}
