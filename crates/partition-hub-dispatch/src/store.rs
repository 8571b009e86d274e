// crates/partition-hub-dispatch/src/store.rs
// ============================================================================
// Module: Partition Object Store
// Description: Read-only key/object store interface for partition datasets.
// Purpose: Abstract the record store a partition service loads from.
// Dependencies: async-trait, thiserror
// ============================================================================

//! ## Overview
//! Partition services read their raw records through [`ObjectStore`]: a
//! bounded `get_object` and a prefix `list_objects`. The S3 implementation
//! lives in [`crate::s3`]; [`InMemoryObjectStore`] backs tests and local runs.
//! Security posture: stored bytes are untrusted and always read under
//! [`MAX_OBJECT_BYTES`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum size of one dataset object.
pub const MAX_OBJECT_BYTES: usize = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Object store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Object does not exist.
    #[error("object not found: {bucket}/{key}")]
    NotFound {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
    },
    /// Object exceeds size limits.
    #[error("object too large: {key} ({actual_bytes} > {max_bytes})")]
    TooLarge {
        /// Object key.
        key: String,
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual size in bytes.
        actual_bytes: usize,
    },
    /// Invalid configuration.
    #[error("object store invalid: {0}")]
    Invalid(String),
    /// Backend I/O failure.
    #[error("object store io error: {0}")]
    Io(String),
    /// Backend returned an error.
    #[error("object store backend error: {0}")]
    Backend(String),
}

// ============================================================================
// SECTION: Interface
// ============================================================================

/// Read-only object store consumed by partition services.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Reads one object, bounded by [`MAX_OBJECT_BYTES`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for missing keys and other variants for
    /// backend or size failures.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Lists keys under `prefix`, in key order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend listing fails.
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError>;
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Object store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    /// Objects keyed by `(bucket, key)`.
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
}

impl InMemoryObjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an object.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the store lock is poisoned.
    pub fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        self.objects
            .lock()
            .map_err(|_| StoreError::Io("object store lock poisoned".to_string()))?
            .insert((bucket.to_string(), key.to_string()), bytes);
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let bytes = self
            .objects
            .lock()
            .map_err(|_| StoreError::Io("object store lock poisoned".to_string()))?
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;
        if bytes.len() > MAX_OBJECT_BYTES {
            return Err(StoreError::TooLarge {
                key: key.to_string(),
                max_bytes: MAX_OBJECT_BYTES,
                actual_bytes: bytes.len(),
            });
        }
        Ok(bytes)
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
        let objects = self
            .objects
            .lock()
            .map_err(|_| StoreError::Io("object store lock poisoned".to_string()))?;
        Ok(objects
            .keys()
            .filter(|(stored_bucket, key)| stored_bucket == bucket && key.starts_with(prefix))
            .map(|(_, key)| key.clone())
            .collect())
    }
}
