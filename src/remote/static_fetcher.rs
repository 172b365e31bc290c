/// Canned-response fetcher (offline replays and tests)
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::Result;
use crate::remote::fetcher::{FetchedResponse, Fetcher};

/// Serves responses registered per URL; unknown URLs answer 404
#[derive(Default)]
pub struct StaticFetcher {
    responses: Arc<RwLock<HashMap<String, FetchedResponse>>>,
    requests: Arc<RwLock<Vec<String>>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        StaticFetcher {
            responses: Arc::new(RwLock::new(HashMap::new())),
            requests: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register (or replace) the response for `url`
    pub async fn respond(&self, url: &str, status: u16, content_type: Option<&str>, body: impl Into<Bytes>) {
        let response = FetchedResponse {
            url: url.to_string(),
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        };
        self.responses.write().await.insert(url.to_string(), response);
    }

    /// Register a 200 response
    pub async fn respond_ok(&self, url: &str, content_type: Option<&str>, body: impl Into<Bytes>) {
        self.respond(url, 200, content_type, body).await;
    }

    /// URLs requested so far, in order
    pub async fn requests(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<FetchedResponse> {
        self.requests.write().await.push(url.to_string());

        let responses = self.responses.read().await;
        match responses.get(url) {
            Some(response) => Ok(response.clone()),
            None => {
                warn!("[static] no response registered for {}", url);
                Ok(FetchedResponse {
                    url: url.to_string(),
                    status: 404,
                    content_type: Some("text/plain".to_string()),
                    body: Bytes::from_static(b"not found"),
                })
            }
        }
    }
}
