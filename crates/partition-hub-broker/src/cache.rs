// crates/partition-hub-broker/src/cache.rs
// ============================================================================
// Module: Credential Cache
// Description: TTL-aware credential reuse in front of a broker.
// Purpose: Avoid one exchange per call while honoring hard expiry.
// Dependencies: partition-hub-core
// ============================================================================

//! ## Overview
//! [`CachingCredentialBroker`] serves a cached credential only while its
//! remaining lifetime is strictly greater than the refresh margin. Anything
//! closer to expiry is re-acquired from the inner broker. Errors pass through
//! and leave the cache untouched.
//!
//! The lock is never held across an exchange, so two callers racing on a cold
//! entry may both exchange; the later insert wins.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use partition_hub_core::AuditSink;
use partition_hub_core::BrokerError;
use partition_hub_core::Clock;
use partition_hub_core::CredentialBroker;
use partition_hub_core::HubAuditEvent;
use partition_hub_core::HubAuditEventParams;
use partition_hub_core::NoopAuditSink;
use partition_hub_core::PartitionId;
use partition_hub_core::ScopedCredential;
use partition_hub_core::SystemClock;
use partition_hub_core::audit::EVENT_CREDENTIAL_CACHE_HIT;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default refresh margin.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(60);

// ============================================================================
// SECTION: Cache
// ============================================================================

/// Credential broker wrapper that reuses unexpired credentials.
pub struct CachingCredentialBroker {
    /// Broker used on cache misses.
    inner: Arc<dyn CredentialBroker>,
    /// Refresh margin.
    margin: Duration,
    /// Time source for lifetime checks.
    clock: Arc<dyn Clock>,
    /// Cached credentials by partition.
    entries: Mutex<BTreeMap<PartitionId, ScopedCredential>>,
    /// Audit sink.
    audit: Arc<dyn AuditSink>,
}

impl CachingCredentialBroker {
    /// Wraps `inner` with the default refresh margin.
    #[must_use]
    pub fn new(inner: Arc<dyn CredentialBroker>) -> Self {
        Self {
            inner,
            margin: DEFAULT_REFRESH_MARGIN,
            clock: Arc::new(SystemClock),
            entries: Mutex::new(BTreeMap::new()),
            audit: Arc::new(NoopAuditSink),
        }
    }

    /// Sets the refresh margin.
    #[must_use]
    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Drops the cached credential for `partition_id`.
    pub fn invalidate(&self, partition_id: &PartitionId) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(partition_id);
        }
    }

    /// Drops every cached credential.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Returns a usable cached credential, evicting stale ones.
    fn lookup(&self, partition_id: &PartitionId) -> Option<ScopedCredential> {
        let mut entries = self.entries.lock().ok()?;
        let now = self.clock.now();
        match entries.get(partition_id) {
            Some(credential) if !credential.needs_refresh_at(now, self.margin) => {
                Some(credential.clone())
            }
            Some(_) => {
                entries.remove(partition_id);
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl CredentialBroker for CachingCredentialBroker {
    async fn acquire(&self, partition_id: &PartitionId) -> Result<ScopedCredential, BrokerError> {
        if let Some(credential) = self.lookup(partition_id) {
            self.audit.record(&HubAuditEvent::new(
                EVENT_CREDENTIAL_CACHE_HIT,
                HubAuditEventParams {
                    partition_id: Some(partition_id.clone()),
                    ..HubAuditEventParams::default()
                },
            ));
            return Ok(credential);
        }
        let credential = self.inner.acquire(partition_id).await?;
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(partition_id.clone(), credential.clone());
        }
        Ok(credential)
    }
}
