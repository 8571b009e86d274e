// crates/partition-hub-core/src/core/partition.rs
// ============================================================================
// Module: Partition Registry
// Description: Immutable partition entries keyed by id.
// Purpose: Resolve endpoints and trust references for partition calls.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! The registry is built once from configuration and never mutated; callers
//! share it behind an `Arc`. Iteration order is registration order so the
//! broadcast planner produces stable results.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::OperationName;
use crate::core::identifiers::PartitionId;
use crate::core::identifiers::TrustBoundaryId;
use crate::core::identifiers::TrustRef;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One isolated data partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Partition identifier.
    pub id: PartitionId,
    /// Display name for operators.
    pub display_name: String,
    /// Trust boundary the partition lives in.
    pub trust_boundary: TrustBoundaryId,
    /// Endpoint address of the partition's tool runtime.
    pub endpoint: String,
    /// Role reference presented to the trust boundary.
    pub credential_role: TrustRef,
    /// Operations the partition exposes. Empty means "not declared".
    pub operations: BTreeSet<OperationName>,
}

impl Partition {
    /// Returns true when the partition declares `operation`, or declares none.
    #[must_use]
    pub fn exposes(&self, operation: &OperationName) -> bool {
        self.operations.is_empty() || self.operations.contains(operation)
    }
}

/// Registry construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The same partition id was registered twice.
    #[error("duplicate partition id: {0}")]
    DuplicatePartition(PartitionId),
}

/// Read-only mapping of partition id to partition entry.
///
/// # Invariants
/// - Partition ids are unique.
/// - Entries are never mutated after construction.
#[derive(Debug, Clone, Default)]
pub struct PartitionRegistry {
    /// Entries in registration order.
    entries: Vec<Partition>,
    /// Index into `entries` by id.
    index: BTreeMap<PartitionId, usize>,
}

impl PartitionRegistry {
    /// Builds a registry from partition entries.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicatePartition`] when an id repeats.
    pub fn new(entries: Vec<Partition>) -> Result<Self, RegistryError> {
        let mut index = BTreeMap::new();
        for (position, partition) in entries.iter().enumerate() {
            if index.insert(partition.id.clone(), position).is_some() {
                return Err(RegistryError::DuplicatePartition(partition.id.clone()));
            }
        }
        Ok(Self {
            entries,
            index,
        })
    }

    /// Looks up a partition by id.
    #[must_use]
    pub fn get(&self, id: &PartitionId) -> Option<&Partition> {
        self.index.get(id).and_then(|position| self.entries.get(*position))
    }

    /// Returns partition ids in registration order.
    #[must_use]
    pub fn ids(&self) -> Vec<PartitionId> {
        self.entries.iter().map(|partition| partition.id.clone()).collect()
    }

    /// Iterates partitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Partition> {
        self.entries.iter()
    }

    /// Returns the number of registered partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no partitions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
