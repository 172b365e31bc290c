/// API exporter: fetch the configured JSON endpoint and store it under a fixed key
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::error::Result;
use crate::remote::Fetcher;
use crate::storage::ObjectStore;
use crate::types::Config;

const JSON_CONTENT_TYPE: &str = "application/json";
const FALLBACK_CONTENT_TYPE: &str = "text/plain";

pub struct ApiExporter {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn ObjectStore>,
    config: Arc<Config>,
}

impl ApiExporter {
    pub fn new(fetcher: Arc<dyn Fetcher>, store: Arc<dyn ObjectStore>, config: Arc<Config>) -> Self {
        ApiExporter {
            fetcher,
            store,
            config,
        }
    }

    /// Export the API payload. Returns `false` without touching storage when
    /// no API URL is configured.
    pub async fn export(&self) -> Result<bool> {
        if !self.config.api_export_enabled() {
            info!("[API] Skipping: api_url not set");
            return Ok(false);
        }

        let timeout = Duration::from_secs(self.config.listing_timeout_secs);
        let response = self
            .fetcher
            .get(&self.config.api_url, timeout)
            .await?
            .error_for_status()?;

        let (payload, content_type) = match serde_json::from_slice::<serde_json::Value>(&response.body) {
            Ok(json) => (serde_json::to_vec(&json)?, JSON_CONTENT_TYPE.to_string()),
            Err(_) => (
                response.text().into_bytes(),
                response
                    .content_type
                    .clone()
                    .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string()),
            ),
        };

        let key = self.config.api_key();
        self.store.put(&key, payload, Some(&content_type)).await?;

        info!("[API] Exported to {} ({})", key, content_type);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::remote::StaticFetcher;
    use crate::storage::MemoryObjectStore;
    use crate::types::StorageBackend;

    const API_URL: &str = "https://honolulu-api.datausa.io/tesseract/data.jsonrecords?cube=acs_yg_total_population_1&drilldowns=Year%2CNation&measures=Population";

    fn config_with_api(api_url: &str) -> Arc<Config> {
        Arc::new(Config {
            storage_backend: StorageBackend::Memory,
            api_url: api_url.to_string(),
            ..Config::default()
        })
    }

    #[tokio::test]
    async fn test_no_url_is_a_no_op() {
        let fetcher = Arc::new(StaticFetcher::new());
        let store = Arc::new(MemoryObjectStore::new());
        let exporter = ApiExporter::new(fetcher.clone(), store.clone(), config_with_api(""));

        assert!(!exporter.export().await.unwrap());
        assert_eq!(store.write_count(), 0);
        assert!(fetcher.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_json_payload_is_stored_as_json() {
        let fetcher = Arc::new(StaticFetcher::new());
        let store = Arc::new(MemoryObjectStore::new());
        fetcher
            .respond_ok(
                API_URL,
                Some("application/json; charset=utf-8"),
                r#"{ "data": [ { "Year": 2013, "Population": 316128839 } ] }"#,
            )
            .await;

        let exporter = ApiExporter::new(fetcher, store.clone(), config_with_api(API_URL));
        assert!(exporter.export().await.unwrap());

        let object = store.get("api-data/population.json").await.unwrap().unwrap();
        assert_eq!(object.content_type.as_deref(), Some("application/json"));
        let value: serde_json::Value = serde_json::from_slice(&object.content).unwrap();
        assert_eq!(value["data"][0]["Year"], 2013);
    }

    #[tokio::test]
    async fn test_json_payload_keeps_field_order() {
        let fetcher = Arc::new(StaticFetcher::new());
        let store = Arc::new(MemoryObjectStore::new());
        fetcher
            .respond_ok(
                API_URL,
                Some("application/json"),
                r#"{"data": [{"Year": 2013, "Population": 316128839, "Nation": "United States"}], "annotations": {}}"#,
            )
            .await;

        let exporter = ApiExporter::new(fetcher, store.clone(), config_with_api(API_URL));
        assert!(exporter.export().await.unwrap());

        let object = store.get("api-data/population.json").await.unwrap().unwrap();
        assert_eq!(
            String::from_utf8(object.content).unwrap(),
            r#"{"data":[{"Year":2013,"Population":316128839,"Nation":"United States"}],"annotations":{}}"#
        );
    }

    #[tokio::test]
    async fn test_non_json_payload_keeps_content_type() {
        let fetcher = Arc::new(StaticFetcher::new());
        let store = Arc::new(MemoryObjectStore::new());
        fetcher
            .respond_ok(API_URL, Some("text/csv"), "Year,Population\n2013,316128839\n")
            .await;

        let exporter = ApiExporter::new(fetcher, store.clone(), config_with_api(API_URL));
        assert!(exporter.export().await.unwrap());

        let object = store.get("api-data/population.json").await.unwrap().unwrap();
        assert_eq!(object.content_type.as_deref(), Some("text/csv"));
        assert_eq!(object.content, b"Year,Population\n2013,316128839\n".to_vec());
    }

    #[tokio::test]
    async fn test_http_error_is_fetch_error() {
        let fetcher = Arc::new(StaticFetcher::new());
        let store = Arc::new(MemoryObjectStore::new());
        fetcher.respond(API_URL, 502, None, "bad gateway").await;

        let exporter = ApiExporter::new(fetcher, store.clone(), config_with_api(API_URL));
        let err = exporter.export().await.unwrap_err();

        assert!(matches!(err, SyncError::Fetch { status: 502, .. }));
        assert_eq!(store.write_count(), 0);
    }
}
