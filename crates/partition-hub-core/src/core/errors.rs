// crates/partition-hub-core/src/core/errors.rs
// ============================================================================
// Module: Partition Hub Error Taxonomy
// Description: Stable error kinds and per-layer error enums.
// Purpose: Classify every partition-call failure into one wire-visible kind.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every failure that reaches a [`crate::ToolResult`] is classified by an
//! [`ErrorKind`] and rendered as a [`ToolFailure`]. Broker and client layers
//! keep their own `thiserror` enums and map into the shared kind so the
//! orchestrator can apply one retry policy.
//!
//! Security posture: remote bodies are carried lossily and bounded; they are
//! untrusted input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::OperationName;
use crate::core::identifiers::PartitionId;

// ============================================================================
// SECTION: Error Kind
// ============================================================================

/// Wire-stable classification of partition-call failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Partition id is not in the registry.
    PartitionNotFound,
    /// Trust boundary refused the exchange, or the credential is unusable.
    CredentialDenied,
    /// Trust boundary could not be reached or throttled the exchange.
    BrokerUnavailable,
    /// Partition endpoint answered with a non-success status.
    RemoteRejected,
    /// Call exceeded its deadline.
    Timeout,
    /// Partition endpoint returned no bytes.
    EmptyResponse,
    /// Argument failed validation at the partition.
    InvalidArgument,
    /// No operation matches the request at the partition.
    NoMatchingOperation,
    /// Partition endpoint could not be reached.
    EndpointUnavailable,
    /// Partition endpoint returned a body that is not JSON.
    MalformedResponse,
}

impl ErrorKind {
    /// Returns the stable snake_case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PartitionNotFound => "partition_not_found",
            Self::CredentialDenied => "credential_denied",
            Self::BrokerUnavailable => "broker_unavailable",
            Self::RemoteRejected => "remote_rejected",
            Self::Timeout => "timeout",
            Self::EmptyResponse => "empty_response",
            Self::InvalidArgument => "invalid_argument",
            Self::NoMatchingOperation => "no_matching_operation",
            Self::EndpointUnavailable => "endpoint_unavailable",
            Self::MalformedResponse => "malformed_response",
        }
    }

    /// Returns true when a single retry is permitted for this kind.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::BrokerUnavailable | Self::Timeout)
    }
}

// ============================================================================
// SECTION: Tool Failure
// ============================================================================

/// Structured failure carried inside a [`crate::ToolResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    /// Failure classification.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Remote HTTP status when the partition rejected the call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Bounded copy of the remote body when the partition rejected the call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Offending argument key for validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Offending operation name for dispatch failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

impl ToolFailure {
    /// Creates a failure with only a kind and message.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            body: None,
            key: None,
            operation: None,
        }
    }

    /// Attaches the offending argument key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attaches the offending operation name.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }
}

// ============================================================================
// SECTION: Broker Errors
// ============================================================================

/// Credential broker failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    /// Partition id is not registered.
    #[error("partition not found: {0}")]
    PartitionNotFound(PartitionId),
    /// Trust boundary denied the exchange or returned unusable material.
    #[error("credential denied for {partition}: {reason}")]
    CredentialDenied {
        /// Partition the credential was requested for.
        partition: PartitionId,
        /// Denial reason.
        reason: String,
    },
    /// Trust boundary was unreachable, timed out, or throttled.
    #[error("credential broker unavailable for {partition}: {reason}")]
    BrokerUnavailable {
        /// Partition the credential was requested for.
        partition: PartitionId,
        /// Failure detail.
        reason: String,
    },
}

impl BrokerError {
    /// Returns the shared error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::PartitionNotFound(_) => ErrorKind::PartitionNotFound,
            Self::CredentialDenied {
                ..
            } => ErrorKind::CredentialDenied,
            Self::BrokerUnavailable {
                ..
            } => ErrorKind::BrokerUnavailable,
        }
    }
}

impl From<&BrokerError> for ToolFailure {
    fn from(error: &BrokerError) -> Self {
        Self::new(error.kind(), error.to_string())
    }
}

// ============================================================================
// SECTION: Invoke Errors
// ============================================================================

/// Remote tool client failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    /// Credential is expired or scoped to another partition.
    #[error("credential rejected before send: {0}")]
    CredentialDenied(String),
    /// Partition answered with a non-success status.
    #[error("partition rejected call with status {status}")]
    RemoteRejected {
        /// HTTP status code.
        status: u16,
        /// Bounded, lossy UTF-8 copy of the body.
        body: String,
    },
    /// Call exceeded its deadline.
    #[error("partition call timed out after {0} ms")]
    Timeout(u64),
    /// Partition returned zero bytes.
    #[error("partition returned an empty response")]
    EmptyResponse,
    /// Partition endpoint could not be reached.
    #[error("partition endpoint unavailable: {0}")]
    EndpointUnavailable(String),
    /// Partition returned an unparseable body.
    #[error("malformed partition response: {0}")]
    MalformedResponse(String),
}

impl InvokeError {
    /// Returns the shared error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CredentialDenied(_) => ErrorKind::CredentialDenied,
            Self::RemoteRejected {
                ..
            } => ErrorKind::RemoteRejected,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::EmptyResponse => ErrorKind::EmptyResponse,
            Self::EndpointUnavailable(_) => ErrorKind::EndpointUnavailable,
            Self::MalformedResponse(_) => ErrorKind::MalformedResponse,
        }
    }
}

impl From<&InvokeError> for ToolFailure {
    fn from(error: &InvokeError) -> Self {
        let failure = Self::new(error.kind(), error.to_string());
        match error {
            InvokeError::RemoteRejected {
                status,
                body,
            } => Self {
                status: Some(*status),
                body: Some(body.clone()),
                ..failure
            },
            _ => failure,
        }
    }
}

/// Builds the failure reported when a partition does not expose an operation.
#[must_use]
pub fn no_matching_operation(partition: &PartitionId, operation: &OperationName) -> ToolFailure {
    ToolFailure::new(
        ErrorKind::NoMatchingOperation,
        format!("partition {partition} does not expose operation {operation}"),
    )
    .with_operation(operation.as_str())
}
