// crates/partition-hub-core/src/core/tool.rs
// ============================================================================
// Module: Tool Requests and Results
// Description: Request shape sent to partitions and the per-partition outcome.
// Purpose: Carry explicit or implicit tool calls and their captured results.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`ToolRequest`] is explicit when it names an operation and implicit when
//! only the argument bag is known. Either way it serializes to the partition
//! endpoint protocol `{operation?, arguments}`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::errors::ToolFailure;
use crate::core::identifiers::OperationName;
use crate::core::identifiers::PartitionId;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Flat mapping of parameter name to JSON value.
pub type ArgumentBag = Map<String, Value>;

/// Tool invocation sent to one partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Operation named by the caller, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<OperationName>,
    /// Argument bag.
    #[serde(default)]
    pub arguments: ArgumentBag,
}

impl ToolRequest {
    /// Creates an explicit request naming `operation`.
    #[must_use]
    pub const fn explicit(operation: OperationName, arguments: ArgumentBag) -> Self {
        Self {
            operation: Some(operation),
            arguments,
        }
    }

    /// Creates an implicit request whose operation the partition infers.
    #[must_use]
    pub const fn implicit(arguments: ArgumentBag) -> Self {
        Self {
            operation: None,
            arguments,
        }
    }
}

/// Captured outcome of one partition call.
///
/// # Invariants
/// - `success` implies `error.is_none()`; failure implies `error.is_some()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Partition the result belongs to.
    pub partition_id: PartitionId,
    /// Whether the call succeeded.
    pub success: bool,
    /// Result payload on success.
    pub payload: Option<Value>,
    /// Structured failure.
    pub error: Option<ToolFailure>,
    /// True when a stream closed before its end marker.
    pub incomplete_stream: bool,
    /// Attempts made; 0 when the call was rejected before any attempt.
    pub attempts: u32,
}

impl ToolResult {
    /// Builds a successful result.
    #[must_use]
    pub const fn succeeded(partition_id: PartitionId, payload: Value) -> Self {
        Self {
            partition_id,
            success: true,
            payload: Some(payload),
            error: None,
            incomplete_stream: false,
            attempts: 1,
        }
    }

    /// Builds a failed result.
    #[must_use]
    pub const fn failed(partition_id: PartitionId, error: ToolFailure) -> Self {
        Self {
            partition_id,
            success: false,
            payload: None,
            error: Some(error),
            incomplete_stream: false,
            attempts: 1,
        }
    }

    /// Sets the attempt count.
    #[must_use]
    pub const fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}
