/// HTTP GET abstraction and the reqwest-backed client
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use crate::error::{Result, SyncError};

/// A fully buffered HTTP response
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchedResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into `SyncError::Fetch`
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(SyncError::Fetch {
                url: self.url,
                status: self.status,
            })
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<FetchedResponse>;
}

/// reqwest client sending the configured user agent on every request
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()?;

        Ok(HttpFetcher { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str, timeout: Duration) -> Result<FetchedResponse> {
        debug!("GET {}", url);

        let response = self.client.get(url).timeout(timeout).send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        debug!("GET {} -> {} ({} bytes)", url, status, body.len());

        Ok(FetchedResponse {
            url: url.to_string(),
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_for_status() {
        let ok = FetchedResponse {
            url: "https://download.bls.gov/pub/time.series/pr/".to_string(),
            status: 200,
            content_type: Some("text/html".to_string()),
            body: Bytes::from_static(b"<html></html>"),
        };
        assert!(ok.clone().error_for_status().is_ok());

        let forbidden = FetchedResponse { status: 403, ..ok };
        match forbidden.error_for_status() {
            Err(SyncError::Fetch { status, .. }) => assert_eq!(status, 403),
            other => panic!("expected fetch error, got {:?}", other),
        }
    }
}
