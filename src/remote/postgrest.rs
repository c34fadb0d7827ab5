//! PostgREST HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};

use super::RemoteStore;
use crate::config::RemoteConfig;
use crate::domain::RemoteTable;
use crate::error::MonitorError;

const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=minimal";
const INSERT_PREFER: &str = "return=minimal";

/// Longest response body quoted in an error.
const MAX_ERROR_BODY: usize = 512;

/// Remote store reached through a PostgREST endpoint
/// (`{base_url}/rest/v1/{table}`).
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    client: reqwest::Client,
    base_url: String,
}

impl PostgrestClient {
    /// Builds a client that authenticates every request with the service key.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Config`] if the key is not a valid header
    /// value or the HTTP client cannot be built.
    pub fn new(config: &RemoteConfig) -> Result<Self, MonitorError> {
        let header = |value: &str| {
            HeaderValue::from_str(value)
                .map_err(|e| MonitorError::Config(format!("SUPABASE_SERVICE_KEY: {e}")))
        };
        let mut headers = HeaderMap::new();
        headers.insert("apikey", header(&config.service_key)?);
        headers.insert(AUTHORIZATION, header(&format!("Bearer {}", config.service_key))?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MonitorError::Config(format!("remote client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: RemoteTable) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    async fn post(
        &self,
        table: RemoteTable,
        url: String,
        prefer: &'static str,
        rows: Vec<serde_json::Value>,
    ) -> Result<(), MonitorError> {
        let remote_err = |message: String| MonitorError::Remote {
            table: table.name().to_string(),
            message,
        };
        let response = self
            .client
            .post(url)
            .header("Prefer", prefer)
            .json(&rows)
            .send()
            .await
            .map_err(|e| remote_err(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(MAX_ERROR_BODY).collect();
        Err(remote_err(format!("HTTP {}: {body}", status.as_u16())))
    }
}

#[async_trait]
impl RemoteStore for PostgrestClient {
    async fn upsert(
        &self,
        table: RemoteTable,
        on_conflict: &str,
        rows: Vec<serde_json::Value>,
    ) -> Result<(), MonitorError> {
        let url = format!("{}?on_conflict={on_conflict}", self.table_url(table));
        self.post(table, url, UPSERT_PREFER, rows).await
    }

    async fn insert(
        &self,
        table: RemoteTable,
        rows: Vec<serde_json::Value>,
    ) -> Result<(), MonitorError> {
        self.post(table, self.table_url(table), INSERT_PREFER, rows).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn urls_follow_the_rest_layout() {
        let config = RemoteConfig {
            base_url: "https://project.supabase.test/".to_string(),
            service_key: "service-key".to_string(),
            timeout_secs: 5,
        };
        let Ok(client) = PostgrestClient::new(&config) else {
            panic!("client should build");
        };
        assert_eq!(
            client.table_url(RemoteTable::IncomeTracking),
            "https://project.supabase.test/rest/v1/income_tracking"
        );
    }

    #[test]
    fn invalid_key_is_a_config_error() {
        let config = RemoteConfig {
            base_url: "https://project.supabase.test".to_string(),
            service_key: "bad\nkey".to_string(),
            timeout_secs: 5,
        };
        assert!(matches!(PostgrestClient::new(&config), Err(MonitorError::Config(_))));
    }
}
