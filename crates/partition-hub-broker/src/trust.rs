// crates/partition-hub-broker/src/trust.rs
// ============================================================================
// Module: Trust Boundary Interface
// Description: Narrow exchange seam between the broker and an identity service.
// Purpose: Keep credential delegation swappable and testable.
// Dependencies: async-trait, partition-hub-core, thiserror
// ============================================================================

//! ## Overview
//! A trust boundary accepts `{boundary, role, session name, duration}` and answers with
//! access material plus an expiry, or a classified failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use partition_hub_core::AccessMaterial;
use partition_hub_core::Timestamp;
use partition_hub_core::TrustBoundaryId;
use partition_hub_core::TrustRef;
use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Exchange request presented to a trust boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRequest {
    /// Trust boundary owning the partition.
    pub trust_boundary: TrustBoundaryId,
    /// Role reference to assume.
    pub role: TrustRef,
    /// Session name recorded by the trust boundary.
    pub session_name: String,
    /// Requested session duration.
    pub duration: Duration,
}

/// Successful exchange result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeGrant {
    /// Temporary access material.
    pub material: AccessMaterial,
    /// Expiry reported by the trust boundary.
    pub expires_at: Timestamp,
}

/// Exchange failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// Trust relationship rejected the request.
    #[error("exchange denied: {0}")]
    Denied(String),
    /// Trust boundary unreachable, timed out, or throttled.
    #[error("exchange unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Identity exchange service.
#[async_trait]
pub trait TrustBoundary: Send + Sync {
    /// Exchanges the caller's identity for temporary access material.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError`] when the exchange is denied or unavailable.
    async fn exchange(&self, request: &ExchangeRequest) -> Result<ExchangeGrant, ExchangeError>;
}
