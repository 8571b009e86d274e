// crates/partition-hub-orchestrator/tests/aggregator.rs
// ============================================================================
// Module: Aggregator And Hub Tests
// Description: Fan-out, failure isolation, retry, and comparison behavior.
// Purpose: Exercise the orchestrator against scripted collaborators.
// Dependencies: partition-hub-orchestrator, partition-hub-core, tokio
// ============================================================================
//! ## Overview
//! A scripted broker and invoker stand in for the trust boundary and the
//! partition endpoints. Unscripted calls succeed and echo their arguments.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use partition_hub_core::AccessMaterial;
use partition_hub_core::BrokerError;
use partition_hub_core::CredentialBroker;
use partition_hub_core::ErrorKind;
use partition_hub_core::InvokeError;
use partition_hub_core::MemoryAuditSink;
use partition_hub_core::OperationName;
use partition_hub_core::Partition;
use partition_hub_core::PartitionId;
use partition_hub_core::PartitionRegistry;
use partition_hub_core::ScopedCredential;
use partition_hub_core::Timestamp;
use partition_hub_core::ToolFailure;
use partition_hub_core::ToolInvoker;
use partition_hub_core::ToolRequest;
use partition_hub_core::ToolResult;
use partition_hub_core::TrustBoundaryId;
use partition_hub_core::TrustRef;
use partition_hub_core::audit::EVENT_AGGREGATE_COMPLETE;
use partition_hub_core::audit::EVENT_PARTITION_CALL;
use partition_hub_orchestrator::Aggregator;
use partition_hub_orchestrator::AggregatorSettings;
use partition_hub_orchestrator::Hub;
use partition_hub_orchestrator::HubError;
use partition_hub_orchestrator::HubRequest;
use partition_hub_orchestrator::QueryPlanner;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const TIMEOUT: Duration = Duration::from_millis(200);

/// Scripted invoker behavior for one attempt.
enum Step {
    Hang,
    Fail(InvokeError),
    Envelope(ToolFailure),
}

#[derive(Default)]
struct ScriptedBroker {
    script: Mutex<BTreeMap<String, VecDeque<BrokerError>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBroker {
    fn fail_next(&self, partition: &str, error: BrokerError) {
        self.script.lock().unwrap().entry(partition.to_string()).or_default().push_back(error);
    }

    fn calls_for(&self, partition: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|id| *id == partition).count()
    }
}

#[async_trait]
impl CredentialBroker for ScriptedBroker {
    async fn acquire(&self, partition_id: &PartitionId) -> Result<ScopedCredential, BrokerError> {
        self.calls.lock().unwrap().push(partition_id.to_string());
        let scripted =
            self.script.lock().unwrap().get_mut(partition_id.as_str()).and_then(VecDeque::pop_front);
        if let Some(error) = scripted {
            return Err(error);
        }
        Ok(ScopedCredential {
            partition_id: partition_id.clone(),
            material: AccessMaterial {
                access_key_id: "ASIATEST".to_string(),
                secret_access_key: "secret".to_string(),
                session_token: "token".to_string(),
            },
            issued_at: Timestamp::from_unix_millis(0),
            expires_at: Timestamp::from_unix_millis(900_000),
        })
    }
}

#[derive(Default)]
struct ScriptedInvoker {
    script: Mutex<BTreeMap<String, VecDeque<Step>>>,
    always_hang: Mutex<BTreeSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedInvoker {
    fn push(&self, partition: &str, step: Step) {
        self.script.lock().unwrap().entry(partition.to_string()).or_default().push_back(step);
    }

    fn hang(&self, partition: &str) {
        self.always_hang.lock().unwrap().insert(partition.to_string());
    }

    fn calls_for(&self, partition: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|id| *id == partition).count()
    }
}

#[async_trait]
impl ToolInvoker for ScriptedInvoker {
    async fn invoke(
        &self,
        partition: &Partition,
        credential: &ScopedCredential,
        request: &ToolRequest,
        _timeout: Duration,
    ) -> Result<ToolResult, InvokeError> {
        assert_eq!(credential.partition_id, partition.id);
        self.calls.lock().unwrap().push(partition.id.to_string());
        let hang = self.always_hang.lock().unwrap().contains(partition.id.as_str());
        let step = if hang {
            Some(Step::Hang)
        } else {
            self.script.lock().unwrap().get_mut(partition.id.as_str()).and_then(VecDeque::pop_front)
        };
        match step {
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(InvokeError::EmptyResponse)
            }
            Some(Step::Fail(error)) => Err(error),
            Some(Step::Envelope(failure)) => Ok(ToolResult::failed(partition.id.clone(), failure)),
            None => Ok(ToolResult::succeeded(
                partition.id.clone(),
                json!({"partition": partition.id.as_str(), "arguments": request.arguments}),
            )),
        }
    }
}

fn partition(id: &str, operations: &[&str]) -> Partition {
    Partition {
        id: PartitionId::new(id),
        display_name: id.to_string(),
        trust_boundary: TrustBoundaryId::new(format!("{id}-account")),
        endpoint: format!("https://{id}.example.com/invocations"),
        credential_role: TrustRef::new(format!("arn:aws:iam::000000000000:role/{id}")),
        operations: operations.iter().copied().map(OperationName::new).collect(),
    }
}

struct Harness {
    broker: Arc<ScriptedBroker>,
    invoker: Arc<ScriptedInvoker>,
    audit: Arc<MemoryAuditSink>,
    aggregator: Aggregator,
}

fn harness() -> Harness {
    let registry = PartitionRegistry::new(vec![
        partition("corporate_banking", &["query_customer_loans", "get_industry_exposure"]),
        partition("treasury_risk", &[]),
        partition("wealth", &[]),
    ])
    .unwrap();
    let broker = Arc::new(ScriptedBroker::default());
    let invoker = Arc::new(ScriptedInvoker::default());
    let audit = Arc::new(MemoryAuditSink::default());
    let aggregator = Aggregator::new(
        Arc::new(registry),
        Arc::clone(&broker) as Arc<dyn CredentialBroker>,
        Arc::clone(&invoker) as Arc<dyn ToolInvoker>,
        AggregatorSettings {
            partition_timeout: TIMEOUT,
            max_retries: 1,
        },
    )
    .with_audit(Arc::clone(&audit) as Arc<dyn partition_hub_core::AuditSink>);
    Harness {
        broker,
        invoker,
        audit,
        aggregator,
    }
}

fn ids(values: &[&str]) -> Vec<PartitionId> {
    values.iter().copied().map(PartitionId::new).collect()
}

fn request(arguments: Value) -> ToolRequest {
    ToolRequest::implicit(arguments.as_object().cloned().unwrap())
}

// ============================================================================
// SECTION: Fan-Out
// ============================================================================

#[tokio::test]
async fn one_result_per_distinct_partition_in_request_order() {
    let harness = harness();
    let response = harness
        .aggregator
        .aggregate(
            Some("exposure".to_string()),
            &ids(&["treasury_risk", "missing", "corporate_banking", "treasury_risk"]),
            &request(json!({})),
        )
        .await;
    let order: Vec<&str> = response.results.iter().map(|result| result.partition_id.as_str()).collect();
    assert_eq!(order, vec!["treasury_risk", "missing", "corporate_banking"]);
    assert_eq!(response.metadata.partitions_queried, ids(&["treasury_risk", "missing", "corporate_banking"]));
    assert_eq!(response.metadata.architecture, "hub-and-spoke");
    assert_eq!(response.metadata.query.as_deref(), Some("exposure"));
    assert_eq!(response.metadata.succeeded, 2);
    assert_eq!(response.metadata.failed, 1);

    let missing = response.result_for(&PartitionId::new("missing")).unwrap();
    assert_eq!(missing.error.as_ref().unwrap().kind, ErrorKind::PartitionNotFound);
    assert_eq!(missing.attempts, 0);
    assert_eq!(harness.invoker.calls_for("treasury_risk"), 1);
}

#[tokio::test]
async fn compare_isolates_a_hanging_partition() {
    let harness = harness();
    harness.invoker.hang("corporate_banking");
    let started = Instant::now();
    let response = harness
        .aggregator
        .compare(
            "technology_exposure",
            None,
            &ids(&["corporate_banking", "treasury_risk"]),
            &request(json!({"industry": "Technology"})),
        )
        .await;
    assert!(started.elapsed() < Duration::from_secs(3));

    let slow = response.result_for(&PartitionId::new("corporate_banking")).unwrap();
    assert!(!slow.success);
    assert_eq!(slow.error.as_ref().unwrap().kind, ErrorKind::Timeout);
    assert_eq!(slow.attempts, 2);

    let fast = response.result_for(&PartitionId::new("treasury_risk")).unwrap();
    assert!(fast.success);
    assert_eq!(fast.attempts, 1);

    let comparison = response.comparison.unwrap();
    assert_eq!(comparison.metric, "technology_exposure");
    assert_eq!(comparison.by_partition[&PartitionId::new("corporate_banking")], None);
    assert_eq!(
        comparison.by_partition[&PartitionId::new("treasury_risk")].as_ref().unwrap()["arguments"],
        json!({"industry": "Technology"})
    );
}

#[tokio::test]
async fn overrides_replace_the_shared_request_per_partition() {
    let harness = harness();
    let mut overrides = BTreeMap::new();
    overrides.insert(PartitionId::new("treasury_risk"), request(json!({"bank_name": "Citi"})));
    let response = harness
        .aggregator
        .aggregate_with_overrides(
            None,
            &ids(&["corporate_banking", "treasury_risk"]),
            &request(json!({"industry": "Energy"})),
            &overrides,
        )
        .await;
    let payload = |id: &str| {
        response.result_for(&PartitionId::new(id)).unwrap().payload.clone().unwrap()["arguments"].clone()
    };
    assert_eq!(payload("corporate_banking"), json!({"industry": "Energy"}));
    assert_eq!(payload("treasury_risk"), json!({"bank_name": "Citi"}));
}

// ============================================================================
// SECTION: Retry Policy
// ============================================================================

#[tokio::test]
async fn broker_unavailable_is_retried_once() {
    let harness = harness();
    harness.broker.fail_next(
        "treasury_risk",
        BrokerError::BrokerUnavailable {
            partition: PartitionId::new("treasury_risk"),
            reason: "throttled".to_string(),
        },
    );
    let response =
        harness.aggregator.aggregate(None, &ids(&["treasury_risk"]), &request(json!({}))).await;
    let result = &response.results[0];
    assert!(result.success);
    assert_eq!(result.attempts, 2);
    assert_eq!(harness.broker.calls_for("treasury_risk"), 2);
}

#[tokio::test]
async fn credential_denied_is_not_retried() {
    let harness = harness();
    harness.broker.fail_next(
        "treasury_risk",
        BrokerError::CredentialDenied {
            partition: PartitionId::new("treasury_risk"),
            reason: "trust revoked".to_string(),
        },
    );
    let response =
        harness.aggregator.aggregate(None, &ids(&["treasury_risk"]), &request(json!({}))).await;
    let result = &response.results[0];
    assert_eq!(result.error.as_ref().unwrap().kind, ErrorKind::CredentialDenied);
    assert_eq!(result.attempts, 1);
    assert_eq!(harness.invoker.calls_for("treasury_risk"), 0);
}

#[tokio::test]
async fn transport_timeout_is_retried_but_rejection_is_not() {
    let harness = harness();
    harness.invoker.push("treasury_risk", Step::Fail(InvokeError::Timeout(200)));
    harness.invoker.push(
        "wealth",
        Step::Fail(InvokeError::RemoteRejected {
            status: 503,
            body: "unavailable".to_string(),
        }),
    );
    let response = harness
        .aggregator
        .aggregate(None, &ids(&["treasury_risk", "wealth"]), &request(json!({})))
        .await;
    let retried = response.result_for(&PartitionId::new("treasury_risk")).unwrap();
    assert!(retried.success);
    assert_eq!(retried.attempts, 2);
    let rejected = response.result_for(&PartitionId::new("wealth")).unwrap();
    let error = rejected.error.as_ref().unwrap();
    assert_eq!(error.kind, ErrorKind::RemoteRejected);
    assert_eq!(error.status, Some(503));
    assert_eq!(rejected.attempts, 1);
}

#[tokio::test]
async fn partition_reported_failures_are_final() {
    let harness = harness();
    harness.invoker.push(
        "treasury_risk",
        Step::Envelope(ToolFailure::new(ErrorKind::InvalidArgument, "bad").with_key("exposure_millions")),
    );
    let response =
        harness.aggregator.aggregate(None, &ids(&["treasury_risk"]), &request(json!({}))).await;
    let result = &response.results[0];
    assert_eq!(result.error.as_ref().unwrap().key.as_deref(), Some("exposure_millions"));
    assert_eq!(result.attempts, 1);
    assert_eq!(harness.invoker.calls_for("treasury_risk"), 1);
}

#[tokio::test]
async fn unexposed_operation_is_rejected_without_a_call() {
    let harness = harness();
    let tool = ToolRequest::explicit(OperationName::new("get_market_data"), serde_json::Map::new());
    let response = harness.aggregator.aggregate(None, &ids(&["corporate_banking"]), &tool).await;
    let error = response.results[0].error.as_ref().unwrap();
    assert_eq!(error.kind, ErrorKind::NoMatchingOperation);
    assert_eq!(error.operation.as_deref(), Some("get_market_data"));
    assert_eq!(harness.broker.calls_for("corporate_banking"), 0);
    assert_eq!(harness.invoker.calls_for("corporate_banking"), 0);
}

// ============================================================================
// SECTION: Audit
// ============================================================================

#[tokio::test]
async fn every_attempt_and_the_aggregate_are_audited() {
    let harness = harness();
    harness.invoker.push("treasury_risk", Step::Fail(InvokeError::Timeout(200)));
    let _ = harness
        .aggregator
        .aggregate(None, &ids(&["treasury_risk", "wealth"]), &request(json!({})))
        .await;
    let calls = harness.audit.events_named(EVENT_PARTITION_CALL);
    assert_eq!(calls.len(), 3);
    let failures: Vec<_> = calls.iter().filter(|event| event.outcome == Some("failure")).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].error_kind, Some("timeout"));
    assert_eq!(failures[0].attempt, Some(1));
    let complete = harness.audit.events_named(EVENT_AGGREGATE_COMPLETE);
    assert_eq!(complete.len(), 1);
    assert_eq!(complete[0].detail.as_deref(), Some("partitions=2 succeeded=2 failed=0"));
}

// ============================================================================
// SECTION: Hub
// ============================================================================

struct FixedPlanner(Vec<PartitionId>);

#[async_trait]
impl QueryPlanner for FixedPlanner {
    async fn plan(
        &self,
        _request: &HubRequest,
        _registry: &PartitionRegistry,
    ) -> Result<Vec<PartitionId>, HubError> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn hub_broadcasts_when_no_partitions_are_named() {
    let hub = Hub::new(harness().aggregator);
    let response = hub.handle(&HubRequest::default()).await.unwrap();
    assert_eq!(response.metadata.partitions_queried, ids(&["corporate_banking", "treasury_risk", "wealth"]));
    assert!(response.comparison.is_none());
}

#[tokio::test]
async fn hub_uses_the_planner_and_comparison_metric() {
    let hub = Hub::new(harness().aggregator)
        .with_planner(Arc::new(FixedPlanner(ids(&["wealth", "treasury_risk"]))));
    let request: HubRequest = serde_json::from_value(json!({
        "query": "compare lines of business",
        "arguments": {"industry": "Energy"},
        "compare": "energy_exposure"
    }))
    .unwrap();
    let response = hub.handle(&request).await.unwrap();
    assert_eq!(response.metadata.partitions_queried, ids(&["wealth", "treasury_risk"]));
    assert_eq!(response.comparison.unwrap().by_partition.len(), 2);
}

#[tokio::test]
async fn hub_comparison_honors_per_partition_overrides() {
    let hub = Hub::new(harness().aggregator);
    let request: HubRequest = serde_json::from_value(json!({
        "partitions": ["corporate_banking", "treasury_risk"],
        "arguments": {"industry": "Energy"},
        "compare": "energy_exposure",
        "overrides": {"treasury_risk": {"arguments": {"industry": "Energy", "exposure_millions": 100}}}
    }))
    .unwrap();
    let response = hub.handle(&request).await.unwrap();
    let comparison = response.comparison.unwrap();
    assert_eq!(comparison.metric, "energy_exposure");
    let arguments = |id: &str| {
        comparison.by_partition[&PartitionId::new(id)].as_ref().unwrap()["arguments"].clone()
    };
    assert_eq!(arguments("corporate_banking"), json!({"industry": "Energy"}));
    assert_eq!(arguments("treasury_risk"), json!({"industry": "Energy", "exposure_millions": 100}));
}

#[tokio::test]
async fn hub_rejects_requests_addressing_no_partitions() {
    let hub = Hub::new(harness().aggregator);
    let request = HubRequest {
        partitions: Some(Vec::new()),
        ..HubRequest::default()
    };
    assert_eq!(hub.handle(&request).await.unwrap_err(), HubError::NoPartitions);
}

#[tokio::test]
async fn composite_serializes_with_stable_field_names() {
    let hub = Hub::new(harness().aggregator);
    let request = HubRequest {
        partitions: Some(ids(&["treasury_risk"])),
        ..HubRequest::default()
    };
    let value = serde_json::to_value(hub.handle(&request).await.unwrap()).unwrap();
    let result = &value["results"][0];
    for field in ["partition_id", "success", "payload", "incomplete_stream", "attempts"] {
        assert!(result.get(field).is_some(), "missing {field}");
    }
    assert_eq!(value["metadata"]["architecture"], json!("hub-and-spoke"));
    assert_eq!(value["metadata"]["succeeded"], json!(1));
}
