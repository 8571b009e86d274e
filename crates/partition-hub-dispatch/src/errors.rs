// crates/partition-hub-dispatch/src/errors.rs
// ============================================================================
// Module: Dispatch Errors
// Description: Failures raised while resolving or running a partition operation.
// Purpose: Carry the offending key or operation back to the caller.
// Dependencies: partition-hub-core, thiserror
// ============================================================================

//! ## Overview
//! [`DispatchError`] is request-scoped and travels back inside the partition
//! envelope as a [`ToolFailure`]. [`ServiceLoadError`] is raised once, when a
//! partition service is constructed from its store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use partition_hub_core::ErrorKind;
use partition_hub_core::ToolFailure;
use thiserror::Error;

use crate::store::StoreError;

// ============================================================================
// SECTION: Dispatch Errors
// ============================================================================

/// Request-time dispatch failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// An argument has the wrong type, an invalid value, or is missing.
    #[error("invalid argument {key}: {reason}")]
    InvalidArgument {
        /// Offending argument key.
        key: String,
        /// Human-readable reason.
        reason: String,
    },
    /// No operation matches the request.
    #[error("no matching operation {}", .operation.as_deref().unwrap_or("for implicit request"))]
    NoMatchingOperation {
        /// Operation named by the caller, when the request was explicit.
        operation: Option<String>,
    },
}

impl DispatchError {
    /// Builds an invalid-argument error.
    #[must_use]
    pub fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the shared error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument {
                ..
            } => ErrorKind::InvalidArgument,
            Self::NoMatchingOperation {
                ..
            } => ErrorKind::NoMatchingOperation,
        }
    }
}

impl From<&DispatchError> for ToolFailure {
    fn from(error: &DispatchError) -> Self {
        let failure = Self::new(error.kind(), error.to_string());
        match error {
            DispatchError::InvalidArgument {
                key,
                ..
            } => failure.with_key(key.as_str()),
            DispatchError::NoMatchingOperation {
                operation: Some(operation),
            } => failure.with_operation(operation.as_str()),
            DispatchError::NoMatchingOperation {
                operation: None,
            } => failure,
        }
    }
}

// ============================================================================
// SECTION: Load Errors
// ============================================================================

/// Partition service construction failures.
#[derive(Debug, Error)]
pub enum ServiceLoadError {
    /// Dataset could not be read from the store.
    #[error("dataset unavailable: {0}")]
    Store(#[from] StoreError),
    /// Dataset bytes are not a valid dataset document.
    #[error("dataset {key} is invalid: {reason}")]
    Dataset {
        /// Object key of the dataset.
        key: String,
        /// Parse failure.
        reason: String,
    },
}
