// crates/partition-hub-broker/src/broker.rs
// ============================================================================
// Module: Registry Credential Broker
// Description: Registry-backed credential acquisition with expiry clamping.
// Purpose: Issue one scoped credential per call for a registered partition.
// Dependencies: partition-hub-core, crate::trust
// ============================================================================

//! ## Overview
//! [`RegistryCredentialBroker`] looks the partition up, runs one exchange
//! against the trust boundary, and bounds the reported expiry by the
//! requested session duration. It never caches; wrap it in
//! [`crate::CachingCredentialBroker`] for reuse across calls.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use partition_hub_config::BrokerConfig;
use partition_hub_core::AuditSink;
use partition_hub_core::BrokerError;
use partition_hub_core::Clock;
use partition_hub_core::CredentialBroker;
use partition_hub_core::HubAuditEvent;
use partition_hub_core::HubAuditEventParams;
use partition_hub_core::NoopAuditSink;
use partition_hub_core::PartitionId;
use partition_hub_core::PartitionRegistry;
use partition_hub_core::ScopedCredential;
use partition_hub_core::SystemClock;
use partition_hub_core::audit::EVENT_CREDENTIAL_ISSUED;

use crate::trust::ExchangeError;
use crate::trust::ExchangeRequest;
use crate::trust::TrustBoundary;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Exchange parameters shared by every acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    /// Session name presented to the trust boundary.
    pub session_name: String,
    /// Requested session duration and expiry ceiling.
    pub session_duration: Duration,
}

impl From<&BrokerConfig> for BrokerSettings {
    fn from(config: &BrokerConfig) -> Self {
        Self {
            session_name: config.session_name.clone(),
            session_duration: config.session_duration(),
        }
    }
}

// ============================================================================
// SECTION: Broker
// ============================================================================

/// Credential broker resolving role references from the partition registry.
pub struct RegistryCredentialBroker {
    /// Partition registry.
    registry: Arc<PartitionRegistry>,
    /// Exchange implementation.
    boundary: Arc<dyn TrustBoundary>,
    /// Exchange parameters.
    settings: BrokerSettings,
    /// Time source for issue instants.
    clock: Arc<dyn Clock>,
    /// Audit sink.
    audit: Arc<dyn AuditSink>,
}

impl RegistryCredentialBroker {
    /// Creates a broker using the system clock and no audit sink.
    #[must_use]
    pub fn new(
        registry: Arc<PartitionRegistry>,
        boundary: Arc<dyn TrustBoundary>,
        settings: BrokerSettings,
    ) -> Self {
        Self {
            registry,
            boundary,
            settings,
            clock: Arc::new(SystemClock),
            audit: Arc::new(NoopAuditSink),
        }
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
}

#[async_trait]
impl CredentialBroker for RegistryCredentialBroker {
    async fn acquire(&self, partition_id: &PartitionId) -> Result<ScopedCredential, BrokerError> {
        let partition = self
            .registry
            .get(partition_id)
            .ok_or_else(|| BrokerError::PartitionNotFound(partition_id.clone()))?;
        let request = ExchangeRequest {
            trust_boundary: partition.trust_boundary.clone(),
            role: partition.credential_role.clone(),
            session_name: self.settings.session_name.clone(),
            duration: self.settings.session_duration,
        };
        let issued_at = self.clock.now();
        let grant = self.boundary.exchange(&request).await.map_err(|err| match err {
            ExchangeError::Denied(reason) => BrokerError::CredentialDenied {
                partition: partition_id.clone(),
                reason,
            },
            ExchangeError::Unavailable(reason) => BrokerError::BrokerUnavailable {
                partition: partition_id.clone(),
                reason,
            },
        })?;
        let ceiling = issued_at.saturating_add(self.settings.session_duration);
        let expires_at = grant.expires_at.min(ceiling);
        if expires_at <= issued_at {
            return Err(BrokerError::CredentialDenied {
                partition: partition_id.clone(),
                reason: "trust boundary returned an already expired credential".to_string(),
            });
        }
        self.audit.record(&HubAuditEvent::new(
            EVENT_CREDENTIAL_ISSUED,
            HubAuditEventParams {
                partition_id: Some(partition_id.clone()),
                detail: Some(format!(
                    "trust_boundary={} lifetime_ms={}",
                    partition.trust_boundary,
                    issued_at.until(expires_at).as_millis()
                )),
                ..HubAuditEventParams::default()
            },
        ));
        Ok(ScopedCredential {
            partition_id: partition_id.clone(),
            material: grant.material,
            issued_at,
            expires_at,
        })
    }
}
