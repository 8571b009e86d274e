// crates/partition-hub-core/src/audit.rs
// ============================================================================
// Module: Partition Hub Audit Logging
// Description: Structured audit events for credential exchange and partition calls.
// Purpose: Emit redacted JSON-lines audit records without a logging framework.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Audit events are flat JSON objects, one per line. Sinks are swappable so
//! deployments can route events to stderr, an append-only file, or nowhere.
//! Access material is never part of an event; only partition ids, operation
//! names, error kinds, and timings are recorded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::ErrorKind;
use crate::core::PartitionId;

// ============================================================================
// SECTION: Event Names
// ============================================================================

/// Credential minted by the trust boundary.
pub const EVENT_CREDENTIAL_ISSUED: &str = "credential_issued";
/// Credential served from the cache.
pub const EVENT_CREDENTIAL_CACHE_HIT: &str = "credential_cache_hit";
/// One partition call attempt finished.
pub const EVENT_PARTITION_CALL: &str = "partition_call";
/// A stream frame could not be decoded and was skipped.
pub const EVENT_STREAM_FRAME_SKIPPED: &str = "stream_frame_skipped";
/// An orchestration call finished.
pub const EVENT_AGGREGATE_COMPLETE: &str = "aggregate_complete";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Partition hub audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct HubAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Partition identifier when the event concerns one partition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition_id: Option<PartitionId>,
    /// Operation name when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Outcome label (`success` or `failure`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<&'static str>,
    /// Normalized error kind label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    /// Attempt number (1-based).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
    /// Latency in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    /// Free-form, non-secret detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Inputs required to construct a hub audit event.
#[derive(Debug, Clone, Default)]
pub struct HubAuditEventParams {
    /// Partition identifier.
    pub partition_id: Option<PartitionId>,
    /// Operation name.
    pub operation: Option<String>,
    /// Failure kind, when the event records a failure.
    pub error_kind: Option<ErrorKind>,
    /// Whether an outcome is being recorded.
    pub record_outcome: bool,
    /// Attempt number.
    pub attempt: Option<u32>,
    /// Latency in milliseconds.
    pub latency_ms: Option<u64>,
    /// Free-form detail.
    pub detail: Option<String>,
}

impl HubAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(event: &'static str, params: HubAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        let outcome = params
            .record_outcome
            .then_some(if params.error_kind.is_some() { "failure" } else { "success" });
        Self {
            event,
            timestamp_ms,
            partition_id: params.partition_id,
            operation: params.operation,
            outcome,
            error_kind: params.error_kind.map(ErrorKind::as_str),
            attempt: params.attempt,
            latency_ms: params.latency_ms,
            detail: params.detail,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for hub events.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &HubAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &HubAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &HubAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &HubAuditEvent) {}
}

/// Audit sink that keeps events in memory for inspection.
#[derive(Default)]
pub struct MemoryAuditSink {
    /// Recorded events in arrival order.
    events: Mutex<Vec<HubAuditEvent>>,
}

impl MemoryAuditSink {
    /// Returns a snapshot of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HubAuditEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Returns the recorded events named `event`.
    #[must_use]
    pub fn events_named(&self, event: &str) -> Vec<HubAuditEvent> {
        self.events().into_iter().filter(|recorded| recorded.event == event).collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &HubAuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests;
