// crates/partition-hub-dispatch/src/table.rs
// ============================================================================
// Module: Dispatch Decision Table
// Description: Ordered key-presence rules that select one operation.
// Purpose: Resolve an untagged argument bag deterministically.
// Dependencies: crate::arguments
// ============================================================================

//! ## Overview
//! A [`DecisionTable`] is an ordered list of [`Rule`]s evaluated against the
//! set of *known* keys present in the bag (non-null values only). The first
//! matching rule wins. Keys no operation declares are ignored entirely, so
//! they never change which rule fires. A table without an [`Predicate::Always`]
//! rule can fail to match, which the dispatcher reports as no matching
//! operation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::arguments::Arguments;

// ============================================================================
// SECTION: Predicates
// ============================================================================

/// Condition over the present known keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// No known key is present.
    EmptyBag,
    /// The key is present.
    Has(&'static str),
    /// Exactly these keys are present, and nothing else known.
    Exactly(&'static [&'static str]),
    /// At least one nested predicate holds.
    Any(Vec<Predicate>),
    /// Every nested predicate holds.
    All(Vec<Predicate>),
    /// Always holds.
    Always,
}

impl Predicate {
    /// Evaluates the predicate against the present known keys.
    #[must_use]
    pub fn holds(&self, present: &BTreeSet<&'static str>) -> bool {
        match self {
            Self::EmptyBag => present.is_empty(),
            Self::Has(key) => present.contains(key),
            Self::Exactly(keys) => {
                present.len() == keys.len() && keys.iter().all(|key| present.contains(key))
            }
            Self::Any(predicates) => predicates.iter().any(|predicate| predicate.holds(present)),
            Self::All(predicates) => predicates.iter().all(|predicate| predicate.holds(present)),
            Self::Always => true,
        }
    }
}

// ============================================================================
// SECTION: Rules
// ============================================================================

/// One decision-list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Short label used in diagnostics and tests.
    pub label: &'static str,
    /// Selection condition.
    pub when: Predicate,
    /// Operation selected when the condition holds.
    pub operation: &'static str,
}

impl Rule {
    /// Creates a rule.
    #[must_use]
    pub const fn new(label: &'static str, when: Predicate, operation: &'static str) -> Self {
        Self {
            label,
            when,
            operation,
        }
    }
}

/// Ordered, first-match decision list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionTable {
    /// Keys declared by any operation of the partition.
    known_keys: BTreeSet<&'static str>,
    /// Rules in precedence order.
    rules: Vec<Rule>,
}

impl DecisionTable {
    /// Builds a table over `known_keys`.
    #[must_use]
    pub fn new(known_keys: impl IntoIterator<Item = &'static str>, rules: Vec<Rule>) -> Self {
        Self {
            known_keys: known_keys.into_iter().collect(),
            rules,
        }
    }

    /// Returns the first rule matching the bag, if any.
    #[must_use]
    pub fn select(&self, arguments: &Arguments<'_>) -> Option<&Rule> {
        let present = arguments.present_known(&self.known_keys);
        self.rules.iter().find(|rule| rule.when.holds(&present))
    }

    /// Returns the rules in precedence order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns the declared keys.
    #[must_use]
    pub const fn known_keys(&self) -> &BTreeSet<&'static str> {
        &self.known_keys
    }
}
