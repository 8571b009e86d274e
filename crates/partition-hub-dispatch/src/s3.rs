// crates/partition-hub-dispatch/src/s3.rs
// ============================================================================
// Module: S3 Object Store
// Description: S3-backed implementation of the partition object store.
// Purpose: Load partition datasets from durable object storage.
// Dependencies: aws-config, aws-sdk-s3, tokio
// ============================================================================

//! ## Overview
//! [`S3ObjectStore`] reads objects with a streaming, size-bounded loop and
//! lists keys with `ListObjectsV2`, following continuation tokens until the
//! listing is exhausted. Missing keys map to [`StoreError::NotFound`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use partition_hub_config::ObjectStoreConfig;
use tokio::io::AsyncReadExt;

use crate::store::MAX_OBJECT_BYTES;
use crate::store::ObjectStore;
use crate::store::StoreError;

// ============================================================================
// SECTION: Store
// ============================================================================

/// S3-backed object store.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    /// Underlying S3 client.
    client: Client,
}

impl S3ObjectStore {
    /// Builds a store from configuration, resolving credentials from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when the configuration is invalid.
    pub async fn from_config(config: &ObjectStoreConfig) -> Result<Self, StoreError> {
        config.validate().map_err(|err| StoreError::Invalid(err.to_string()))?;
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = config.region.clone() {
            loader = loader.region(Region::new(region));
        }
        if let Some(endpoint) = config.endpoint.clone() {
            loader = loader.endpoint_url(endpoint);
        }
        let shared_config = loader.load().await;
        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if config.force_path_style {
            s3_builder = s3_builder.force_path_style(true);
        }
        Ok(Self::from_client(Client::from_conf(s3_builder.build())))
    }

    /// Wraps an existing client.
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self {
            client,
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let output =
            self.client.get_object().bucket(bucket).key(key).send().await.map_err(|err| {
                if err.as_service_error().is_some_and(|service| service.is_no_such_key()) {
                    StoreError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    StoreError::Backend(DisplayErrorContext(&err).to_string())
                }
            })?;
        if let Some(length) = output.content_length() {
            let actual_bytes = usize::try_from(length).unwrap_or(usize::MAX);
            if actual_bytes > MAX_OBJECT_BYTES {
                return Err(StoreError::TooLarge {
                    key: key.to_string(),
                    max_bytes: MAX_OBJECT_BYTES,
                    actual_bytes,
                });
            }
        }
        let mut reader = output.body.into_async_read();
        let mut buffer = Vec::new();
        let mut total_bytes = 0usize;
        let mut chunk = [0u8; 8192];
        loop {
            let read =
                reader.read(&mut chunk).await.map_err(|err| StoreError::Io(err.to_string()))?;
            if read == 0 {
                break;
            }
            total_bytes = total_bytes
                .checked_add(read)
                .ok_or_else(|| StoreError::Io("object size overflow".to_string()))?;
            if total_bytes > MAX_OBJECT_BYTES {
                return Err(StoreError::TooLarge {
                    key: key.to_string(),
                    max_bytes: MAX_OBJECT_BYTES,
                    actual_bytes: total_bytes,
                });
            }
            buffer.extend_from_slice(&chunk[.. read]);
        }
        Ok(buffer)
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|err| StoreError::Backend(DisplayErrorContext(&err).to_string()))?;
            keys.extend(output.contents().iter().filter_map(|object| object.key()).map(str::to_string));
            match output.next_continuation_token() {
                Some(token) if output.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }
        keys.sort();
        Ok(keys)
    }
}
