// crates/partition-hub-orchestrator/src/hub.rs
// ============================================================================
// Module: Hub Entrypoint
// Description: Orchestration request model, planner seam, and dispatch to the aggregator.
// Purpose: Turn one caller request into one composite response.
// Dependencies: async-trait, serde, partition-hub-core
// ============================================================================

//! ## Overview
//! A [`HubRequest`] names partitions explicitly or leaves the choice to a
//! [`QueryPlanner`]. The planner is opaque: it may be a reasoning component
//! that reads the query text, or the default [`BroadcastPlanner`] that
//! addresses every registered partition. A comparison metric turns the call
//! into a cross-partition comparison.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use partition_hub_core::ArgumentBag;
use partition_hub_core::CompositeResponse;
use partition_hub_core::ErrorKind;
use partition_hub_core::OperationName;
use partition_hub_core::PartitionId;
use partition_hub_core::PartitionRegistry;
use partition_hub_core::ToolRequest;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::aggregator::Aggregator;

// ============================================================================
// SECTION: Request
// ============================================================================

/// Caller request accepted by the hub.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HubRequest {
    /// Free-form query text, echoed in the response metadata.
    #[serde(default)]
    pub query: Option<String>,
    /// Partitions to address; the planner decides when absent.
    #[serde(default)]
    pub partitions: Option<Vec<PartitionId>>,
    /// Operation to run; partitions infer it from the arguments when absent.
    #[serde(default)]
    pub operation: Option<OperationName>,
    /// Shared argument bag.
    #[serde(default)]
    pub arguments: ArgumentBag,
    /// Comparison metric; present for comparison requests.
    #[serde(default)]
    pub compare: Option<String>,
    /// Per-partition replacements for the shared request.
    #[serde(default)]
    pub overrides: BTreeMap<PartitionId, ToolRequest>,
}

impl HubRequest {
    /// Returns the shared tool request.
    #[must_use]
    pub fn tool_request(&self) -> ToolRequest {
        ToolRequest {
            operation: self.operation.clone(),
            arguments: self.arguments.clone(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Hub entrypoint failures. Per-partition failures never surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// The request resolved to no partitions.
    #[error("request addresses no partitions")]
    NoPartitions,
    /// The planner could not choose partitions.
    #[error("query planner failed: {0}")]
    Planner(String),
}

impl HubError {
    /// Returns the shared error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoPartitions | Self::Planner(_) => ErrorKind::PartitionNotFound,
        }
    }
}

// ============================================================================
// SECTION: Planner
// ============================================================================

/// Chooses partitions for requests that do not name any.
#[async_trait]
pub trait QueryPlanner: Send + Sync {
    /// Returns the partitions to address, in call order.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Planner`] when no decision can be made.
    async fn plan(
        &self,
        request: &HubRequest,
        registry: &PartitionRegistry,
    ) -> Result<Vec<PartitionId>, HubError>;
}

/// Planner that addresses every registered partition.
#[derive(Debug, Clone, Copy, Default)]
pub struct BroadcastPlanner;

#[async_trait]
impl QueryPlanner for BroadcastPlanner {
    async fn plan(
        &self,
        _request: &HubRequest,
        registry: &PartitionRegistry,
    ) -> Result<Vec<PartitionId>, HubError> {
        Ok(registry.ids())
    }
}

// ============================================================================
// SECTION: Hub
// ============================================================================

/// Orchestration entrypoint.
pub struct Hub {
    /// Fan-out engine.
    aggregator: Aggregator,
    /// Partition selection for unscoped requests.
    planner: Arc<dyn QueryPlanner>,
}

impl Hub {
    /// Creates a hub with the broadcast planner.
    #[must_use]
    pub fn new(aggregator: Aggregator) -> Self {
        Self {
            aggregator,
            planner: Arc::new(BroadcastPlanner),
        }
    }

    /// Replaces the planner.
    #[must_use]
    pub fn with_planner(mut self, planner: Arc<dyn QueryPlanner>) -> Self {
        self.planner = planner;
        self
    }

    /// Returns the aggregator.
    #[must_use]
    pub const fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Handles one request.
    ///
    /// # Errors
    ///
    /// Returns [`HubError`] when no partitions can be addressed.
    pub async fn handle(&self, request: &HubRequest) -> Result<CompositeResponse, HubError> {
        let partition_ids = match &request.partitions {
            Some(partitions) => partitions.clone(),
            None => self.planner.plan(request, self.aggregator.registry()).await?,
        };
        if partition_ids.is_empty() {
            return Err(HubError::NoPartitions);
        }
        let tool_request = request.tool_request();
        let query = request.query.clone();
        let response = match &request.compare {
            Some(metric) => {
                self.aggregator
                    .compare_with_overrides(
                        metric,
                        query,
                        &partition_ids,
                        &tool_request,
                        &request.overrides,
                    )
                    .await
            }
            None => {
                self.aggregator
                    .aggregate_with_overrides(query, &partition_ids, &tool_request, &request.overrides)
                    .await
            }
        };
        Ok(response)
    }
}
