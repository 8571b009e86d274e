// crates/partition-hub-core/src/audit/tests.rs
// ============================================================================
// Module: Audit Sink Unit Tests
// Description: Tests for audit event construction and sinks.
// Purpose: Ensure audit lines are well-formed JSON and never carry secrets.
// Dependencies: partition-hub-core, tempfile
// ============================================================================

//! ## Overview
//! Exercises event outcome derivation and the file and memory sinks.

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

use serde_json::Value;

use super::AuditSink;
use super::EVENT_CREDENTIAL_ISSUED;
use super::EVENT_PARTITION_CALL;
use super::FileAuditSink;
use super::HubAuditEvent;
use super::HubAuditEventParams;
use super::MemoryAuditSink;
use crate::core::ErrorKind;
use crate::core::PartitionId;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn outcome_is_derived_from_error_kind() {
    let failed = HubAuditEvent::new(
        EVENT_PARTITION_CALL,
        HubAuditEventParams {
            partition_id: Some(PartitionId::new("treasury")),
            error_kind: Some(ErrorKind::Timeout),
            record_outcome: true,
            attempt: Some(2),
            ..HubAuditEventParams::default()
        },
    );
    assert_eq!(failed.outcome, Some("failure"));
    assert_eq!(failed.error_kind, Some("timeout"));

    let ok = HubAuditEvent::new(
        EVENT_PARTITION_CALL,
        HubAuditEventParams {
            record_outcome: true,
            ..HubAuditEventParams::default()
        },
    );
    assert_eq!(ok.outcome, Some("success"));
}

#[test]
fn events_without_outcome_omit_the_field() {
    let event = HubAuditEvent::new(EVENT_CREDENTIAL_ISSUED, HubAuditEventParams::default());
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["event"], "credential_issued");
    assert!(value.get("outcome").is_none());
    assert!(value.get("partition_id").is_none());
}

#[test]
fn file_sink_appends_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.log");
    let sink = FileAuditSink::new(&path).unwrap();
    for attempt in 1 ..= 2 {
        sink.record(&HubAuditEvent::new(
            EVENT_PARTITION_CALL,
            HubAuditEventParams {
                partition_id: Some(PartitionId::new("corporate")),
                attempt: Some(attempt),
                record_outcome: true,
                ..HubAuditEventParams::default()
            },
        ));
    }
    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<Value> =
        contents.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1]["attempt"], 2);
    assert_eq!(lines[0]["partition_id"], "corporate");
}

#[test]
fn memory_sink_filters_by_name() {
    let sink = MemoryAuditSink::default();
    sink.record(&HubAuditEvent::new(EVENT_CREDENTIAL_ISSUED, HubAuditEventParams::default()));
    sink.record(&HubAuditEvent::new(EVENT_PARTITION_CALL, HubAuditEventParams::default()));
    assert_eq!(sink.events().len(), 2);
    assert_eq!(sink.events_named(EVENT_PARTITION_CALL).len(), 1);
}
