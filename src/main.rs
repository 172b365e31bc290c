/// Ingest entry point: sync the remote directory and export the API payload.
/// Invoked by the daily schedule or on demand; prints the run report as JSON.
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use statsync::{
    config::load_config_from_env,
    remote::HttpFetcher,
    storage::open_store,
    utils::init_tracing,
    IngestPipeline,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting ingest run...");

    let config = Arc::new(load_config_from_env().context("loading configuration")?);
    info!(
        "Configuration loaded (storage: {}, source: {})",
        config.storage_backend.as_str(),
        config.bls_url
    );

    let fetcher = Arc::new(HttpFetcher::new(&config.user_agent)?);
    let store = open_store(&config).await?;

    let pipeline = IngestPipeline::new(Arc::clone(&config), fetcher, store);

    match pipeline.run().await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(e) => {
            error!("Ingest run failed: {} ({}, {})", e, e.kind().as_str(), e.error_code());
            Err(e.into())
        }
    }
}
