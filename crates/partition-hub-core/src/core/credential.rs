// crates/partition-hub-core/src/core/credential.rs
// ============================================================================
// Module: Scoped Credentials
// Description: Short-lived, partition-scoped access material.
// Purpose: Carry exchange results with hard expiry semantics.
// Dependencies: crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! A [`ScopedCredential`] is issued for exactly one partition and must never be
//! presented at or after its expiry instant. Access material is redacted from
//! debug output and is never serialized.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use crate::core::identifiers::PartitionId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Access Material
// ============================================================================

/// Temporary access material returned by a trust boundary.
///
/// # Invariants
/// - Secret fields never appear in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessMaterial {
    /// Access key identifier (safe to log).
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Session token presented to partition endpoints.
    pub session_token: String,
}

impl fmt::Debug for AccessMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessMaterial")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// SECTION: Scoped Credential
// ============================================================================

/// Credential set scoped to one partition with a bounded lifetime.
///
/// # Invariants
/// - `expires_at` is strictly after `issued_at` when produced by a broker.
/// - Expiry is hard: a credential is unusable at `now >= expires_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedCredential {
    /// Partition the credential is scoped to.
    pub partition_id: PartitionId,
    /// Opaque access material.
    pub material: AccessMaterial,
    /// Issue instant.
    pub issued_at: Timestamp,
    /// Expiry instant.
    pub expires_at: Timestamp,
}

impl ScopedCredential {
    /// Returns true when the credential is expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }

    /// Returns the remaining lifetime at `now` (zero once expired).
    #[must_use]
    pub fn remaining_at(&self, now: Timestamp) -> Duration {
        now.until(self.expires_at)
    }

    /// Returns true when the remaining lifetime is at or below `margin`.
    #[must_use]
    pub fn needs_refresh_at(&self, now: Timestamp, margin: Duration) -> bool {
        self.remaining_at(now) <= margin
    }
}
