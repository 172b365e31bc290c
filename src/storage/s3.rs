/// S3-compatible object store
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::{debug, info};

use crate::error::{Result, SyncError};
use crate::storage::{validate_key, ObjectStore};
use crate::types::{Config, StoredObject};

#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Resolve credentials from the default AWS provider chain
    #[tracing::instrument(level = "debug", skip(config))]
    pub async fn new(config: &Config) -> Result<Self> {
        if config.bucket_name.trim().is_empty() {
            return Err(SyncError::Config("bucket_name is empty".to_string()));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.aws_region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.s3_endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let shared = loader.load().await;
        let s3_cfg = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.s3_endpoint.is_some())
            .build();

        info!("Using S3 bucket {}", config.bucket_name);

        Ok(Self::from_client(Client::from_conf(s3_cfg), config.bucket_name.clone()))
    }

    pub fn from_client(client: Client, bucket: String) -> Self {
        S3ObjectStore { client, bucket }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[tracing::instrument(level = "debug", skip(self, content))]
    async fn put(&self, key: &str, content: Vec<u8>, content_type: Option<&str>) -> Result<()> {
        validate_key(key)?;

        let len = content.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(Bytes::from(content)))
            .set_content_type(content_type.map(str::to_string))
            .send()
            .await
            .map_err(|e| {
                SyncError::Storage(format!(
                    "put s3://{}/{} failed: {}",
                    self.bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        debug!("[s3] put s3://{}/{} ({} bytes)", self.bucket, key, len);
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get(&self, key: &str) -> Result<Option<StoredObject>> {
        validate_key(key)?;

        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                if e.as_service_error().map(|se| se.is_no_such_key()).unwrap_or(false) {
                    return Ok(None);
                }
                return Err(SyncError::Storage(format!(
                    "get s3://{}/{} failed: {}",
                    self.bucket,
                    key,
                    DisplayErrorContext(&e)
                )));
            }
        };

        let content_type = output.content_type().map(str::to_string);
        let body = output.body.collect().await.map_err(|e| {
            SyncError::Storage(format!("read s3://{}/{} failed: {}", self.bucket, key, e))
        })?;

        Ok(Some(StoredObject::new(key, body.into_bytes().to_vec(), content_type)))
    }
}
