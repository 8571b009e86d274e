// crates/partition-hub-client/src/lib.rs
// ============================================================================
// Module: Partition Hub Client Library
// Description: Remote tool invocation against partition endpoints.
// Purpose: Run one authenticated call and reconstruct one logical result.
// Dependencies: partition-hub-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! [`RemoteToolClient`] posts `{operation?, arguments}` to a partition endpoint
//! with the partition's scoped credential and understands two response
//! shapes: one bounded JSON document, or a `text/event-stream` whose delta
//! frames are replayed through [`FrameDecoder`] and [`StreamAssembler`].
//! Invariants:
//! - Expired or mis-scoped credentials are refused before any I/O.
//! - Response bodies are read under a hard byte limit.
//! - The deadline covers the whole call, including stream consumption.
//!
//! Security posture: partition responses are untrusted input.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod stream;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::ClientBuildError;
pub use client::ClientSettings;
pub use client::RemoteToolClient;
pub use stream::FrameDecoder;
pub use stream::StreamAssembler;
pub use stream::StreamFrame;
pub use stream::StreamOutcome;
pub use stream::reassemble;
