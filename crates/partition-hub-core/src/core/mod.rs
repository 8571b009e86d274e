// crates/partition-hub-core/src/core/mod.rs
// ============================================================================
// Module: Partition Hub Core Types
// Description: Data model for partitions, credentials, tools, and responses.
// Purpose: Group the request-scoped and registry-scoped types.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Core types are plain data. Registry entries are immutable after load;
//! credentials, tool requests, and results live for one orchestration call.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod credential;
pub mod errors;
pub mod identifiers;
pub mod partition;
pub mod response;
pub mod time;
pub mod tool;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use credential::AccessMaterial;
pub use credential::ScopedCredential;
pub use errors::BrokerError;
pub use errors::ErrorKind;
pub use errors::InvokeError;
pub use errors::ToolFailure;
pub use errors::no_matching_operation;
pub use identifiers::OperationName;
pub use identifiers::PartitionId;
pub use identifiers::TrustBoundaryId;
pub use identifiers::TrustRef;
pub use partition::Partition;
pub use partition::PartitionRegistry;
pub use partition::RegistryError;
pub use response::ARCHITECTURE_LABEL;
pub use response::AggregateMetadata;
pub use response::ComparisonPayload;
pub use response::CompositeResponse;
pub use response::PartitionResponse;
pub use time::Clock;
pub use time::ManualClock;
pub use time::SystemClock;
pub use time::Timestamp;
pub use tool::ArgumentBag;
pub use tool::ToolRequest;
pub use tool::ToolResult;

#[cfg(test)]
mod tests;
