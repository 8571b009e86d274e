// crates/partition-hub-orchestrator/src/lib.rs
// ============================================================================
// Module: Partition Hub Orchestrator Library
// Description: Cross-partition fan-out, retry policy, and hub entrypoint.
// Purpose: Merge independent partition results into one composite response.
// Dependencies: partition-hub-core, futures, tokio
// ============================================================================

//! ## Overview
//! [`Aggregator`] runs one acquire-and-invoke unit per distinct partition
//! concurrently and returns a [`partition_hub_core::CompositeResponse`] with
//! exactly one result per partition. [`Hub`] is the request-level entrypoint
//! that resolves partitions through a [`QueryPlanner`] and selects between
//! plain aggregation and comparison.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod aggregator;
pub mod hub;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use aggregator::Aggregator;
pub use aggregator::AggregatorSettings;
pub use aggregator::MAX_RETRIES;
pub use hub::BroadcastPlanner;
pub use hub::Hub;
pub use hub::HubError;
pub use hub::HubRequest;
pub use hub::QueryPlanner;
