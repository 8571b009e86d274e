// crates/partition-hub-dispatch/src/lib.rs
// ============================================================================
// Module: Partition Hub Dispatch Library
// Description: Partition-side operation resolution over a read-only dataset.
// Purpose: Turn a flat argument bag into exactly one executed operation.
// Dependencies: partition-hub-core, aws-sdk-s3, serde_json
// ============================================================================

//! ## Overview
//! Runs inside a partition. A [`PartitionService`] loads its dataset once
//! from an [`ObjectStore`] and declares its operations; the
//! [`AmbiguousDispatcher`] picks one operation per request, by name when the
//! request is tagged and through an ordered [`DecisionTable`] when it is not.
//! Dispatch failures carry the offending key or operation.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod arguments;
pub mod corporate;
pub mod dispatcher;
pub mod errors;
pub mod s3;
pub mod service;
pub mod store;
pub mod table;
pub mod treasury;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use arguments::Arguments;
pub use arguments::ParamKind;
pub use arguments::ParamSpec;
pub use corporate::CORPORATE_DATASET_KEY;
pub use corporate::CorporateBankingService;
pub use corporate::CorporateDataset;
pub use dispatcher::AmbiguousDispatcher;
pub use errors::DispatchError;
pub use errors::ServiceLoadError;
pub use s3::S3ObjectStore;
pub use service::DatasetLocation;
pub use service::OperationSpec;
pub use service::PartitionService;
pub use store::InMemoryObjectStore;
pub use store::MAX_OBJECT_BYTES;
pub use store::ObjectStore;
pub use store::StoreError;
pub use table::DecisionTable;
pub use table::Predicate;
pub use table::Rule;
pub use treasury::TREASURY_DATASET_KEY;
pub use treasury::TreasuryDataset;
pub use treasury::TreasuryRiskService;
