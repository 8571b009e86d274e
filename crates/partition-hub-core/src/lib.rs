// crates/partition-hub-core/src/lib.rs
// ============================================================================
// Module: Partition Hub Core Library
// Description: Public API surface for the Partition Hub core.
// Purpose: Expose partition, credential, tool, and audit types plus interfaces.
// Dependencies: crate::{core, interfaces, audit}
// ============================================================================

//! ## Overview
//! Partition Hub core defines the shared vocabulary of the cross-partition
//! orchestration layer: the read-only partition registry, scoped credentials,
//! tool requests and results, the composite response, and the error taxonomy.
//! Components integrate through the async interfaces in [`interfaces`] so the
//! credential exchange, remote transport, and planner remain swappable.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod core;
pub mod interfaces;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::HubAuditEvent;
pub use audit::HubAuditEventParams;
pub use audit::MemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use interfaces::CredentialBroker;
pub use interfaces::ToolInvoker;
