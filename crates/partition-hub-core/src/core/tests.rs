// crates/partition-hub-core/src/core/tests.rs
// ============================================================================
// Module: Core Type Unit Tests
// Description: Tests for registry, credential, envelope, and error semantics.
// Purpose: Pin the invariants the orchestrator relies on.
// Dependencies: partition-hub-core
// ============================================================================

//! ## Overview
//! Covers registry uniqueness, hard credential expiry, envelope detection,
//! composite counting, and the retry classification.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

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

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::time::Duration;

use serde_json::json;

use super::*;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn partition(id: &str) -> Partition {
    Partition {
        id: PartitionId::new(id),
        display_name: id.to_uppercase(),
        trust_boundary: TrustBoundaryId::new("111122223333"),
        endpoint: format!("https://{id}.example.internal/invoke"),
        credential_role: TrustRef::new(format!("arn:aws:iam::111122223333:role/{id}")),
        operations: BTreeSet::new(),
    }
}

fn credential(partition_id: &str, issued: i64, expires: i64) -> ScopedCredential {
    ScopedCredential {
        partition_id: PartitionId::new(partition_id),
        material: AccessMaterial {
            access_key_id: "ASIAEXAMPLE".to_string(),
            secret_access_key: "secret-value".to_string(),
            session_token: "session-value".to_string(),
        },
        issued_at: Timestamp::from_unix_millis(issued),
        expires_at: Timestamp::from_unix_millis(expires),
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

#[test]
fn registry_rejects_duplicate_ids() {
    let err = PartitionRegistry::new(vec![partition("a"), partition("b"), partition("a")])
        .unwrap_err();
    assert_eq!(err, RegistryError::DuplicatePartition(PartitionId::new("a")));
}

#[test]
fn registry_preserves_registration_order() {
    let registry =
        PartitionRegistry::new(vec![partition("west"), partition("east"), partition("central")])
            .unwrap();
    let ids: Vec<String> = registry.ids().iter().map(ToString::to_string).collect();
    assert_eq!(ids, vec!["west", "east", "central"]);
    assert!(registry.get(&PartitionId::new("east")).is_some());
    assert!(registry.get(&PartitionId::new("north")).is_none());
}

#[test]
fn partition_without_declared_operations_exposes_everything() {
    let mut entry = partition("a");
    assert!(entry.exposes(&OperationName::new("anything")));
    entry.operations.insert(OperationName::new("query_risk_models"));
    assert!(entry.exposes(&OperationName::new("query_risk_models")));
    assert!(!entry.exposes(&OperationName::new("anything")));
}

// ============================================================================
// SECTION: Credentials
// ============================================================================

#[test]
fn credential_expiry_is_hard() {
    let cred = credential("a", 0, 1_000);
    assert!(!cred.is_expired_at(Timestamp::from_unix_millis(999)));
    assert!(cred.is_expired_at(Timestamp::from_unix_millis(1_000)));
    assert_eq!(cred.remaining_at(Timestamp::from_unix_millis(2_000)), Duration::ZERO);
}

#[test]
fn credential_refresh_margin_is_inclusive() {
    let cred = credential("a", 0, 120_000);
    let margin = Duration::from_secs(60);
    assert!(!cred.needs_refresh_at(Timestamp::from_unix_millis(59_999), margin));
    assert!(cred.needs_refresh_at(Timestamp::from_unix_millis(60_000), margin));
}

#[test]
fn access_material_debug_is_redacted() {
    let rendered = format!("{:?}", credential("a", 0, 1));
    assert!(rendered.contains("ASIAEXAMPLE"));
    assert!(!rendered.contains("secret-value"));
    assert!(!rendered.contains("session-value"));
}

#[test]
fn manual_clock_advances() {
    let clock = ManualClock::new(Timestamp::from_unix_millis(10));
    clock.advance(Duration::from_millis(15));
    assert_eq!(clock.now(), Timestamp::from_unix_millis(25));
}

// ============================================================================
// SECTION: Envelope and Composite
// ============================================================================

#[test]
fn envelope_detection_requires_boolean_success_and_known_keys() {
    assert!(PartitionResponse::from_value(&json!({"success": true, "payload": [1]})).is_some());
    assert!(PartitionResponse::from_value(&json!({"success": "yes"})).is_none());
    assert!(PartitionResponse::from_value(&json!({"success": true, "banks": []})).is_none());
    assert!(PartitionResponse::from_value(&json!([1, 2])).is_none());
}

#[test]
fn failed_envelope_keeps_structured_error() {
    let value = json!({
        "success": false,
        "error": {"kind": "invalid_argument", "message": "bad", "key": "exposure_millions"}
    });
    let result = PartitionResponse::from_value(&value).unwrap().into_result(PartitionId::new("t"));
    assert!(!result.success);
    let error = result.error.unwrap();
    assert_eq!(error.kind, ErrorKind::InvalidArgument);
    assert_eq!(error.key.as_deref(), Some("exposure_millions"));
}

#[test]
fn composite_counts_and_comparison_nulls() {
    let results = vec![
        ToolResult::succeeded(PartitionId::new("a"), json!({"total": 3})),
        ToolResult::failed(PartitionId::new("b"), ToolFailure::new(ErrorKind::Timeout, "slow")),
    ];
    let comparison = ComparisonPayload::from_results("exposure", &results);
    let mut response = CompositeResponse::assemble(results, Some("q".to_string()), 12);
    response.comparison = Some(comparison);
    assert_eq!(response.metadata.architecture, ARCHITECTURE_LABEL);
    assert_eq!(response.metadata.succeeded, 1);
    assert_eq!(response.metadata.failed, 1);
    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["comparison"]["by_partition"]["b"], serde_json::Value::Null);
    assert_eq!(value["comparison"]["by_partition"]["a"]["total"], 3);
    assert_eq!(value["results"][1]["error"]["kind"], "timeout");
    assert_eq!(value["results"][0]["incomplete_stream"], false);
}

// ============================================================================
// SECTION: Error Kinds
// ============================================================================

#[test]
fn only_broker_unavailable_and_timeout_are_retryable() {
    let retryable: Vec<ErrorKind> = [
        ErrorKind::PartitionNotFound,
        ErrorKind::CredentialDenied,
        ErrorKind::BrokerUnavailable,
        ErrorKind::RemoteRejected,
        ErrorKind::Timeout,
        ErrorKind::EmptyResponse,
        ErrorKind::InvalidArgument,
        ErrorKind::NoMatchingOperation,
        ErrorKind::EndpointUnavailable,
        ErrorKind::MalformedResponse,
    ]
    .into_iter()
    .filter(|kind| kind.is_retryable())
    .collect();
    assert_eq!(retryable, vec![ErrorKind::BrokerUnavailable, ErrorKind::Timeout]);
}

#[test]
fn remote_rejection_carries_status_and_body() {
    let failure = ToolFailure::from(&InvokeError::RemoteRejected {
        status: 403,
        body: "forbidden".to_string(),
    });
    assert_eq!(failure.kind, ErrorKind::RemoteRejected);
    assert_eq!(failure.status, Some(403));
    assert_eq!(failure.body.as_deref(), Some("forbidden"));
}
