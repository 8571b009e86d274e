// crates/partition-hub-broker/src/lib.rs
// ============================================================================
// Module: Partition Hub Broker Library
// Description: Credential exchange and caching for partition calls.
// Purpose: Turn the hub's identity into short-lived, partition-scoped credentials.
// Dependencies: partition-hub-core, partition-hub-config, aws-sdk-sts
// ============================================================================

//! ## Overview
//! The broker resolves a partition's role reference from the registry, asks a
//! [`TrustBoundary`] to exchange the hub's identity for temporary access
//! material, and returns a [`partition_hub_core::ScopedCredential`].
//! Invariants:
//! - Issued credentials never outlive the requested session duration.
//! - An expiry at or before the issue instant is a denial, not a credential.
//! - Failed exchanges are never cached.
//!
//! Security posture: access material is redacted from debug output and never
//! written to the audit sink.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod broker;
pub mod cache;
pub mod sts;
pub mod trust;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use broker::BrokerSettings;
pub use broker::RegistryCredentialBroker;
pub use cache::CachingCredentialBroker;
pub use cache::DEFAULT_REFRESH_MARGIN;
pub use sts::StsTrustBoundary;
pub use trust::ExchangeError;
pub use trust::ExchangeGrant;
pub use trust::ExchangeRequest;
pub use trust::TrustBoundary;
