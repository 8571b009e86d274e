// crates/partition-hub-orchestrator/src/aggregator.rs
// ============================================================================
// Module: Query Aggregator
// Description: Concurrent per-partition fan-out with bounded retries.
// Purpose: Produce exactly one result per requested partition and merge them.
// Dependencies: futures, partition-hub-core, tokio
// ============================================================================

//! ## Overview
//! For each distinct requested partition the aggregator acquires a scoped
//! credential and invokes the tool, all under one per-attempt deadline. Units
//! share no mutable state and run concurrently through `join_all`; results
//! keep request order. A failure in one unit becomes that partition's failed
//! result and never affects the others.
//!
//! Retry policy: at most one retry, only when the attempt failed with a
//! retryable kind (`broker_unavailable`, `timeout`). Failures reported by the
//! partition inside a successful envelope are final.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use futures::future::join_all;
use partition_hub_config::AggregatorConfig;
use partition_hub_core::AuditSink;
use partition_hub_core::BrokerError;
use partition_hub_core::ComparisonPayload;
use partition_hub_core::CompositeResponse;
use partition_hub_core::CredentialBroker;
use partition_hub_core::ErrorKind;
use partition_hub_core::HubAuditEvent;
use partition_hub_core::HubAuditEventParams;
use partition_hub_core::NoopAuditSink;
use partition_hub_core::Partition;
use partition_hub_core::PartitionId;
use partition_hub_core::PartitionRegistry;
use partition_hub_core::ToolFailure;
use partition_hub_core::ToolInvoker;
use partition_hub_core::ToolRequest;
use partition_hub_core::ToolResult;
use partition_hub_core::audit::EVENT_AGGREGATE_COMPLETE;
use partition_hub_core::audit::EVENT_PARTITION_CALL;
use partition_hub_core::no_matching_operation;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Hard ceiling on retries per partition call.
pub const MAX_RETRIES: u32 = 1;

/// Fan-out limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorSettings {
    /// Deadline for one attempt (credential acquisition plus call).
    pub partition_timeout: Duration,
    /// Retries for retryable failures, clamped to [`MAX_RETRIES`].
    pub max_retries: u32,
}

impl AggregatorSettings {
    /// Total attempts allowed per partition.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        1 + self.max_retries.min(MAX_RETRIES)
    }
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self::from(&AggregatorConfig::default())
    }
}

impl From<&AggregatorConfig> for AggregatorSettings {
    fn from(config: &AggregatorConfig) -> Self {
        Self {
            partition_timeout: config.partition_timeout(),
            max_retries: config.max_retries,
        }
    }
}

// ============================================================================
// SECTION: Aggregator
// ============================================================================

/// Fans one logical request out to partitions and merges the results.
pub struct Aggregator {
    /// Read-only partition registry.
    registry: Arc<PartitionRegistry>,
    /// Credential issuer.
    broker: Arc<dyn CredentialBroker>,
    /// Remote tool transport.
    invoker: Arc<dyn ToolInvoker>,
    /// Limits.
    settings: AggregatorSettings,
    /// Audit sink.
    audit: Arc<dyn AuditSink>,
}

impl Aggregator {
    /// Creates an aggregator.
    #[must_use]
    pub fn new(
        registry: Arc<PartitionRegistry>,
        broker: Arc<dyn CredentialBroker>,
        invoker: Arc<dyn ToolInvoker>,
        settings: AggregatorSettings,
    ) -> Self {
        Self {
            registry,
            broker,
            invoker,
            settings,
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &PartitionRegistry {
        &self.registry
    }

    /// Issues `request` against every listed partition.
    pub async fn aggregate(
        &self,
        query: Option<String>,
        partition_ids: &[PartitionId],
        request: &ToolRequest,
    ) -> CompositeResponse {
        self.aggregate_with_overrides(query, partition_ids, request, &BTreeMap::new()).await
    }

    /// Issues `request` against every listed partition, replacing it with the
    /// override for partitions that have one.
    pub async fn aggregate_with_overrides(
        &self,
        query: Option<String>,
        partition_ids: &[PartitionId],
        request: &ToolRequest,
        overrides: &BTreeMap<PartitionId, ToolRequest>,
    ) -> CompositeResponse {
        let started = Instant::now();
        let targets = distinct(partition_ids);
        let calls = targets.iter().map(|partition_id| {
            let request = overrides.get(partition_id).unwrap_or(request);
            self.call_partition(partition_id, request)
        });
        let results = join_all(calls).await;
        let elapsed_ms = millis(started.elapsed());
        let response = CompositeResponse::assemble(results, query, elapsed_ms);
        self.audit.record(&HubAuditEvent::new(
            EVENT_AGGREGATE_COMPLETE,
            HubAuditEventParams {
                latency_ms: Some(elapsed_ms),
                detail: Some(format!(
                    "partitions={} succeeded={} failed={}",
                    response.results.len(),
                    response.metadata.succeeded,
                    response.metadata.failed
                )),
                ..HubAuditEventParams::default()
            },
        ));
        response
    }

    /// Issues the same request against every listed partition and attaches
    /// an unmerged comparison payload tagged with `metric`.
    pub async fn compare(
        &self,
        metric: &str,
        query: Option<String>,
        partition_ids: &[PartitionId],
        request: &ToolRequest,
    ) -> CompositeResponse {
        self.compare_with_overrides(metric, query, partition_ids, request, &BTreeMap::new()).await
    }

    /// Like [`Self::compare`], replacing the request for partitions that
    /// carry an override.
    pub async fn compare_with_overrides(
        &self,
        metric: &str,
        query: Option<String>,
        partition_ids: &[PartitionId],
        request: &ToolRequest,
        overrides: &BTreeMap<PartitionId, ToolRequest>,
    ) -> CompositeResponse {
        let mut response =
            self.aggregate_with_overrides(query, partition_ids, request, overrides).await;
        response.comparison = Some(ComparisonPayload::from_results(metric, &response.results));
        response
    }

    /// Runs one partition unit, retrying once for retryable failures.
    async fn call_partition(&self, partition_id: &PartitionId, request: &ToolRequest) -> ToolResult {
        let Some(partition) = self.registry.get(partition_id) else {
            let error = BrokerError::PartitionNotFound(partition_id.clone());
            return ToolResult::failed(partition_id.clone(), ToolFailure::from(&error))
                .with_attempts(0);
        };
        if let Some(operation) = &request.operation
            && !partition.exposes(operation)
        {
            return ToolResult::failed(
                partition_id.clone(),
                no_matching_operation(partition_id, operation),
            )
            .with_attempts(0);
        }
        let max_attempts = self.settings.max_attempts();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let started = Instant::now();
            let outcome = self.attempt(partition, request).await;
            self.record_call(partition, request, attempt, started.elapsed(), &outcome);
            match outcome {
                Ok(result) => return result.with_attempts(attempt),
                Err(failure) if failure.kind.is_retryable() && attempt < max_attempts => {}
                Err(failure) => {
                    return ToolResult::failed(partition_id.clone(), failure).with_attempts(attempt);
                }
            }
        }
    }

    /// Runs one attempt under the per-attempt deadline.
    async fn attempt(
        &self,
        partition: &Partition,
        request: &ToolRequest,
    ) -> Result<ToolResult, ToolFailure> {
        let deadline = self.settings.partition_timeout;
        let started = Instant::now();
        let credential = tokio::time::timeout(deadline, self.broker.acquire(&partition.id))
            .await
            .map_err(|_| {
                ToolFailure::new(
                    ErrorKind::BrokerUnavailable,
                    format!("credential exchange for {} timed out", partition.id),
                )
            })?
            .map_err(|err| ToolFailure::from(&err))?;
        let remaining = deadline.saturating_sub(started.elapsed());
        let call = self.invoker.invoke(partition, &credential, request, remaining);
        tokio::time::timeout(remaining, call)
            .await
            .map_err(|_| {
                ToolFailure::new(
                    ErrorKind::Timeout,
                    format!("partition call timed out after {} ms", millis(deadline)),
                )
            })?
            .map_err(|err| ToolFailure::from(&err))
    }

    /// Records one attempt outcome.
    fn record_call(
        &self,
        partition: &Partition,
        request: &ToolRequest,
        attempt: u32,
        latency: Duration,
        outcome: &Result<ToolResult, ToolFailure>,
    ) {
        let error_kind = match outcome {
            Ok(result) => result.error.as_ref().map(|error| error.kind),
            Err(failure) => Some(failure.kind),
        };
        self.audit.record(&HubAuditEvent::new(
            EVENT_PARTITION_CALL,
            HubAuditEventParams {
                partition_id: Some(partition.id.clone()),
                operation: request.operation.as_ref().map(ToString::to_string),
                error_kind,
                record_outcome: true,
                attempt: Some(attempt),
                latency_ms: Some(millis(latency)),
                detail: None,
            },
        ));
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Drops repeated ids, keeping the first occurrence.
fn distinct(partition_ids: &[PartitionId]) -> Vec<PartitionId> {
    let mut seen = BTreeSet::new();
    partition_ids.iter().filter(|id| seen.insert(*id)).cloned().collect()
}

/// Converts a duration to whole milliseconds.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
