// crates/partition-hub-core/src/core/response.rs
// ============================================================================
// Module: Composite and Partition Responses
// Description: Merged orchestration output and the partition wire envelope.
// Purpose: Define the JSON shapes returned by the hub and by partitions.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`CompositeResponse`] is the hub's answer: one [`ToolResult`] per distinct
//! requested partition, aggregate metadata, and an optional unmerged
//! comparison payload. [`PartitionResponse`] is the envelope a partition
//! runtime returns for one tool call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::errors::ErrorKind;
use crate::core::errors::ToolFailure;
use crate::core::identifiers::PartitionId;
use crate::core::tool::ToolResult;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Architecture label stamped on every composite response.
pub const ARCHITECTURE_LABEL: &str = "hub-and-spoke";

// ============================================================================
// SECTION: Composite Response
// ============================================================================

/// Aggregate metadata describing one orchestration call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateMetadata {
    /// Architecture label.
    pub architecture: String,
    /// Partitions addressed, in request order.
    pub partitions_queried: Vec<PartitionId>,
    /// Number of successful results.
    pub succeeded: usize,
    /// Number of failed results.
    pub failed: usize,
    /// Wall-clock time spent in milliseconds.
    pub elapsed_ms: u64,
    /// Query text when supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Unmerged side-by-side payloads for a comparison request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPayload {
    /// Metric being compared.
    pub metric: String,
    /// Payload per partition; `null` for failed partitions.
    pub by_partition: BTreeMap<PartitionId, Option<Value>>,
}

impl ComparisonPayload {
    /// Builds a comparison payload from partition results.
    #[must_use]
    pub fn from_results(metric: impl Into<String>, results: &[ToolResult]) -> Self {
        let by_partition = results
            .iter()
            .map(|result| {
                let payload = if result.success { result.payload.clone() } else { None };
                (result.partition_id.clone(), payload)
            })
            .collect();
        Self {
            metric: metric.into(),
            by_partition,
        }
    }
}

/// Hub response for one orchestration call.
///
/// # Invariants
/// - Exactly one result per distinct requested partition, in request order.
/// - `metadata.succeeded + metadata.failed == results.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeResponse {
    /// Per-partition results.
    pub results: Vec<ToolResult>,
    /// Aggregate metadata.
    pub metadata: AggregateMetadata,
    /// Comparison payload for comparison requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonPayload>,
}

impl CompositeResponse {
    /// Assembles a response and derives the success counts from `results`.
    #[must_use]
    pub fn assemble(results: Vec<ToolResult>, query: Option<String>, elapsed_ms: u64) -> Self {
        let succeeded = results.iter().filter(|result| result.success).count();
        let failed = results.len() - succeeded;
        let partitions_queried = results.iter().map(|result| result.partition_id.clone()).collect();
        Self {
            results,
            metadata: AggregateMetadata {
                architecture: ARCHITECTURE_LABEL.to_string(),
                partitions_queried,
                succeeded,
                failed,
                elapsed_ms,
                query,
            },
            comparison: None,
        }
    }

    /// Returns the result for `partition_id`, if present.
    #[must_use]
    pub fn result_for(&self, partition_id: &PartitionId) -> Option<&ToolResult> {
        self.results.iter().find(|result| &result.partition_id == partition_id)
    }
}

// ============================================================================
// SECTION: Partition Envelope
// ============================================================================

/// Envelope returned by a partition runtime for one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionResponse {
    /// Whether the partition-local operation succeeded.
    pub success: bool,
    /// Result payload on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Structured failure on error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolFailure>,
}

impl PartitionResponse {
    /// Builds a success envelope.
    #[must_use]
    pub const fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    /// Builds a failure envelope.
    #[must_use]
    pub const fn err(error: ToolFailure) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(error),
        }
    }

    /// Attempts to read a JSON value as an envelope.
    ///
    /// Only objects carrying a boolean `success` and nothing beyond
    /// `payload`/`error` qualify; anything else is a bare payload.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        if !object.get("success").is_some_and(Value::is_boolean) {
            return None;
        }
        if object.keys().any(|key| !matches!(key.as_str(), "success" | "payload" | "error")) {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// Converts the envelope into a result for `partition_id`.
    #[must_use]
    pub fn into_result(self, partition_id: PartitionId) -> ToolResult {
        if self.success {
            ToolResult::succeeded(partition_id, self.payload.unwrap_or(Value::Null))
        } else {
            let error = self.error.unwrap_or_else(|| {
                ToolFailure::new(
                    ErrorKind::MalformedResponse,
                    "partition reported failure without an error",
                )
            });
            ToolResult::failed(partition_id, error)
        }
    }
}
