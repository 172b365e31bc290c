/// Aggregation entry point.
/// Usage: run_report [batch.json | -]
///   no argument  -> aggregate once and print the result
///   batch.json   -> process a queue notification batch from the file
///   -            -> read the batch from stdin
use std::sync::Arc;

use anyhow::Context;
use tokio::io::AsyncReadExt;
use tracing::{error, info};

use statsync::{
    aggregate::{Aggregator, NotificationHandler, QueueBatch},
    config::load_config_from_env,
    storage::open_store,
    utils::init_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Arc::new(load_config_from_env().context("loading configuration")?);
    let store = open_store(&config).await?;
    let aggregator = Aggregator::new(store, Arc::clone(&config));

    let Some(source) = std::env::args().nth(1) else {
        info!("No batch given - running one aggregation");
        let result = aggregator.run().await.map_err(|e| {
            error!("Aggregation failed: {} ({})", e, e.kind().as_str());
            e
        })?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    };

    let raw = if source == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(&source)
            .await
            .with_context(|| format!("reading batch from {}", source))?
    };

    let batch: QueueBatch = serde_json::from_str(&raw).context("parsing notification batch")?;
    info!("Processing batch of {} messages", batch.records.len());

    let handler = NotificationHandler::new(&aggregator, &config);
    let response = handler.handle_batch(&batch).await;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
