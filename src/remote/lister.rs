/// Remote directory listing: index page -> downloadable file names
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::error::{Result, SyncError};
use crate::remote::fetcher::Fetcher;
use crate::types::RemoteFileRef;

pub struct RemoteLister {
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
}

impl RemoteLister {
    pub fn new(fetcher: Arc<dyn Fetcher>, timeout: Duration) -> Self {
        RemoteLister { fetcher, timeout }
    }

    /// GET the index page at `base_url` and list the files it links to.
    /// Sub-directory links (targets ending in `/`) are excluded.
    pub async fn list(&self, base_url: &str) -> Result<impl Iterator<Item = RemoteFileRef>> {
        let base = Url::parse(base_url)
            .map_err(|e| SyncError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let response = self.fetcher.get(base.as_str(), self.timeout).await?.error_for_status()?;
        let files = parse_listing(&base, &response.text())?;

        info!("Listed {} files at {}", files.len(), base);
        Ok(files.into_iter())
    }
}

/// Extract file references from a directory index page
pub fn parse_listing(base: &Url, html: &str) -> Result<Vec<RemoteFileRef>> {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]")
        .map_err(|e| SyncError::Parse(format!("invalid selector: {}", e)))?;

    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for anchor in document.select(&anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.ends_with('/') {
            debug!("Skipping directory link {}", href);
            continue;
        }

        let name = href.rsplit('/').next().unwrap_or_default();
        if name.is_empty() || !seen.insert(name.to_string()) {
            continue;
        }

        let url = base
            .join(name)
            .map_err(|e| SyncError::InvalidUrl(format!("{} relative to {}: {}", name, base, e)))?;

        files.push(RemoteFileRef {
            name: name.to_string(),
            url: url.to_string(),
        });
    }

    Ok(files)
}
