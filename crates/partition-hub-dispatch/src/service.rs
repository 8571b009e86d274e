// crates/partition-hub-dispatch/src/service.rs
// ============================================================================
// Module: Partition Service Interface
// Description: Contract between the dispatcher and a partition's operations.
// Purpose: Let one dispatcher front any partition-local dataset.
// Dependencies: serde, serde_json, crate::{arguments, table, store}
// ============================================================================

//! ## Overview
//! A [`PartitionService`] owns a read-only dataset loaded once at
//! construction, declares its operations, and supplies the decision table
//! used for untagged requests. Reloading means building a new service.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::arguments::Arguments;
use crate::arguments::ParamSpec;
use crate::errors::DispatchError;
use crate::errors::ServiceLoadError;
use crate::store::ObjectStore;
use crate::table::DecisionTable;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Declared operation of a partition service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSpec {
    /// Operation name.
    pub name: &'static str,
    /// Declared parameters.
    pub params: &'static [ParamSpec],
}

/// Location of a partition dataset in the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLocation {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
}

impl DatasetLocation {
    /// Creates a location.
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

// ============================================================================
// SECTION: Interface
// ============================================================================

/// Partition-local operations over a read-only dataset.
pub trait PartitionService: Send + Sync {
    /// Line-of-business label reported in payloads.
    fn lob(&self) -> &str;

    /// Declared operations.
    fn operations(&self) -> &'static [OperationSpec];

    /// Decision table for untagged requests.
    fn decision_table(&self) -> &DecisionTable;

    /// Runs `operation` against the dataset.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] for invalid arguments or unknown operations.
    fn execute(&self, operation: &str, arguments: &Arguments<'_>) -> Result<Value, DispatchError>;

    /// Looks up a declared operation by name.
    fn operation(&self, name: &str) -> Option<&'static OperationSpec> {
        self.operations().iter().find(|spec| spec.name == name)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads and parses a dataset document from the store.
///
/// # Errors
///
/// Returns [`ServiceLoadError`] when the object is missing or does not parse.
pub async fn load_dataset<T: DeserializeOwned>(
    store: &dyn ObjectStore,
    location: &DatasetLocation,
) -> Result<T, ServiceLoadError> {
    let bytes = store.get_object(&location.bucket, &location.key).await?;
    serde_json::from_slice(&bytes).map_err(|err| ServiceLoadError::Dataset {
        key: location.key.clone(),
        reason: err.to_string(),
    })
}

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
