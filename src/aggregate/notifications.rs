/// Queue batch handling: run the aggregator for storage notifications and
/// report per-message failures
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::aggregate::Aggregator;
use crate::error::{Result, SyncError};
use crate::types::{AggregationResult, Config};

const TEST_EVENT: &str = "s3:TestEvent";
const JSON_SUFFIX: &str = ".json";

/// A batch of queue messages
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueBatch {
    #[serde(rename = "Records", default)]
    pub records: Vec<QueueMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueMessage {
    #[serde(rename = "messageId")]
    pub message_id: String,
    #[serde(default)]
    pub body: String,
}

/// Storage event carried in a message body
#[derive(Debug, Deserialize)]
struct StorageEvent {
    #[serde(rename = "Records", default)]
    records: Vec<StorageEventRecord>,
    #[serde(rename = "Event")]
    event: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StorageEventRecord {
    s3: StorageEntity,
}

#[derive(Debug, Deserialize)]
struct StorageEntity {
    object: StorageObjectRef,
}

#[derive(Debug, Deserialize)]
struct StorageObjectRef {
    key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItemFailure {
    #[serde(rename = "itemIdentifier")]
    pub item_identifier: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResponse {
    #[serde(rename = "batchItemFailures")]
    pub batch_item_failures: Vec<BatchItemFailure>,
    pub results: Vec<AggregationResult>,
}

pub struct NotificationHandler<'a> {
    aggregator: &'a Aggregator,
    config: &'a Config,
}

impl<'a> NotificationHandler<'a> {
    pub fn new(aggregator: &'a Aggregator, config: &'a Config) -> Self {
        NotificationHandler { aggregator, config }
    }

    /// Process every message; failed messages are reported, not propagated
    pub async fn handle_batch(&self, batch: &QueueBatch) -> BatchResponse {
        let mut response = BatchResponse::default();

        for message in &batch.records {
            match self.handle_message(message).await {
                Ok(Some(result)) => response.results.push(result),
                Ok(None) => {}
                Err(e) => {
                    error!(
                        "Message {} failed: {} ({})",
                        message.message_id,
                        e,
                        e.error_code()
                    );
                    response.batch_item_failures.push(BatchItemFailure {
                        item_identifier: message.message_id.clone(),
                    });
                }
            }
        }

        info!(
            "Processed {} messages: {} aggregated, {} failed",
            batch.records.len(),
            response.results.len(),
            response.batch_item_failures.len()
        );

        response
    }

    /// Aggregate once if the message names a JSON object under the API prefix
    pub async fn handle_message(&self, message: &QueueMessage) -> Result<Option<AggregationResult>> {
        let event: StorageEvent = serde_json::from_str(&message.body)?;

        if event.event.as_deref() == Some(TEST_EVENT) {
            info!("Message {} is a storage test event; skipping", message.message_id);
            return Ok(None);
        }

        let mut relevant = false;
        for record in &event.records {
            let key = decode_key(&record.s3.object.key)?;
            if self.is_relevant(&key) {
                info!("Message {}: {} changed", message.message_id, key);
                relevant = true;
            }
        }

        if !relevant {
            warn!("Message {} has no matching object; skipping", message.message_id);
            return Ok(None);
        }

        self.aggregator.run().await.map(Some)
    }

    fn is_relevant(&self, key: &str) -> bool {
        key.starts_with(&self.config.api_prefix) && key.ends_with(JSON_SUFFIX)
    }
}

/// Object keys arrive form-encoded: `+` for space, `%XX` escapes
pub fn decode_key(raw: &str) -> Result<String> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|k| k.into_owned())
        .map_err(|e| SyncError::Parse(format!("invalid object key '{}': {}", raw, e)))
}
