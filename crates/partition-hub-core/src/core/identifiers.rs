// crates/partition-hub-core/src/core/identifiers.rs
// ============================================================================
// Module: Partition Hub Identifiers
// Description: Opaque identifiers for partitions, operations, and trust references.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque strings on the wire. Validation of allowed
//! characters happens at the configuration boundary, not here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Macro
// ============================================================================

/// Declares an opaque string identifier with the shared conversions.
macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

string_identifier!(
    /// Partition identifier (region or line of business).
    ///
    /// # Invariants
    /// - Unique within a [`crate::PartitionRegistry`].
    PartitionId
);

string_identifier!(
    /// Remote operation name exposed by a partition endpoint.
    OperationName
);

string_identifier!(
    /// Trust boundary identifier (for example the partition's account id).
    TrustBoundaryId
);

string_identifier!(
    /// Credential role reference presented to the trust boundary.
    ///
    /// # Invariants
    /// - Opaque to the hub; the trust boundary interprets it (for example a role ARN).
    TrustRef
);
