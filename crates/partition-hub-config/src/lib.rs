// crates/partition-hub-config/src/lib.rs
// ============================================================================
// Module: Partition Hub Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for partition-hub.toml semantics.
// Dependencies: partition-hub-core, serde, toml, url
// ============================================================================

//! ## Overview
//! `partition-hub-config` defines the configuration model for the hub: the
//! partition registry, credential exchange settings, client limits, the
//! aggregator's timeout and retry budget, and the audit sink. Validation is
//! strict and fail-closed; an invalid file stops startup.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
