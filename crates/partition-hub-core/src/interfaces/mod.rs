// crates/partition-hub-core/src/interfaces/mod.rs
// ============================================================================
// Module: Partition Hub Interfaces
// Description: Async seams for credential exchange and remote tool calls.
// Purpose: Keep the aggregator independent of AWS and HTTP specifics.
// Dependencies: async-trait, crate::core
// ============================================================================

//! ## Overview
//! The aggregator talks to exactly two collaborators: a [`CredentialBroker`]
//! that issues scoped credentials and a [`ToolInvoker`] that runs one call
//! against a partition endpoint. Both are object-safe so deployments and
//! tests can swap implementations behind an `Arc<dyn _>`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;

use crate::core::BrokerError;
use crate::core::InvokeError;
use crate::core::Partition;
use crate::core::PartitionId;
use crate::core::ScopedCredential;
use crate::core::ToolRequest;
use crate::core::ToolResult;

// ============================================================================
// SECTION: Credential Broker
// ============================================================================

/// Issues partition-scoped credentials.
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    /// Acquires a credential for `partition_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError`] when the partition is unknown, the exchange is
    /// denied, or the trust boundary is unavailable.
    async fn acquire(&self, partition_id: &PartitionId) -> Result<ScopedCredential, BrokerError>;
}

// ============================================================================
// SECTION: Tool Invoker
// ============================================================================

/// Runs one tool call against one partition endpoint.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Invokes `request` on `partition` within `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError`] when the credential is unusable, the call fails,
    /// or the response cannot be interpreted.
    async fn invoke(
        &self,
        partition: &Partition,
        credential: &ScopedCredential,
        request: &ToolRequest,
        timeout: Duration,
    ) -> Result<ToolResult, InvokeError>;
}
