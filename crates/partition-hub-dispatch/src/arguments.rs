// crates/partition-hub-dispatch/src/arguments.rs
// ============================================================================
// Module: Argument Access
// Description: Typed, null-aware accessors over a flat argument bag.
// Purpose: Validate argument types once, naming the offending key.
// Dependencies: partition-hub-core, serde_json
// ============================================================================

//! ## Overview
//! JSON `null` counts as absent everywhere. Text filters must be strings.
//! Amounts accept a JSON number or a numeric string and must be finite and
//! non-negative.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use partition_hub_core::ArgumentBag;
use serde_json::Value;

use crate::errors::DispatchError;

// ============================================================================
// SECTION: Parameter Declarations
// ============================================================================

/// Value type of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// String filter.
    Text,
    /// Finite non-negative number.
    Amount,
}

/// One declared operation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    /// Argument key.
    pub key: &'static str,
    /// Value type.
    pub kind: ParamKind,
    /// Whether the operation cannot run without it.
    pub required: bool,
}

impl ParamSpec {
    /// Declares an optional text filter.
    #[must_use]
    pub const fn text(key: &'static str) -> Self {
        Self {
            key,
            kind: ParamKind::Text,
            required: false,
        }
    }

    /// Declares a required text argument.
    #[must_use]
    pub const fn required_text(key: &'static str) -> Self {
        Self {
            key,
            kind: ParamKind::Text,
            required: true,
        }
    }

    /// Declares a required amount argument.
    #[must_use]
    pub const fn required_amount(key: &'static str) -> Self {
        Self {
            key,
            kind: ParamKind::Amount,
            required: true,
        }
    }
}

// ============================================================================
// SECTION: Accessors
// ============================================================================

/// Borrowed view over an argument bag.
#[derive(Debug, Clone, Copy)]
pub struct Arguments<'a> {
    /// Underlying bag.
    bag: &'a ArgumentBag,
}

impl<'a> Arguments<'a> {
    /// Wraps a bag.
    #[must_use]
    pub const fn new(bag: &'a ArgumentBag) -> Self {
        Self {
            bag,
        }
    }

    /// Returns the value for `key`, treating `null` as absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.bag.get(key).filter(|value| !value.is_null())
    }

    /// Returns true when `key` is present and not `null`.
    #[must_use]
    pub fn is_present(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the non-null keys of the bag that appear in `known`.
    #[must_use]
    pub fn present_known(&self, known: &BTreeSet<&'static str>) -> BTreeSet<&'static str> {
        known.iter().copied().filter(|key| self.is_present(key)).collect()
    }

    /// Reads an optional text argument.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidArgument`] when the value is not a string.
    pub fn text(&self, key: &str) -> Result<Option<&'a str>, DispatchError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.as_str())),
            Some(other) => {
                Err(DispatchError::invalid(key, format!("expected a string, got {}", type_name(other))))
            }
        }
    }

    /// Reads a required text argument.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidArgument`] when missing or not a string.
    pub fn required_text(&self, key: &str) -> Result<&'a str, DispatchError> {
        self.text(key)?.ok_or_else(|| DispatchError::invalid(key, "is required"))
    }

    /// Reads an optional amount argument.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidArgument`] when the value is not a finite
    /// non-negative number or numeric string.
    pub fn amount(&self, key: &str) -> Result<Option<f64>, DispatchError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(amount) if amount.is_finite() && amount >= 0.0 => Ok(Some(amount)),
            _ => Err(DispatchError::invalid(key, "expected a finite non-negative number")),
        }
    }

    /// Reads a required amount argument.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidArgument`] when missing or invalid.
    pub fn required_amount(&self, key: &str) -> Result<f64, DispatchError> {
        self.amount(key)?.ok_or_else(|| DispatchError::invalid(key, "is required"))
    }

    /// Validates every declared parameter against the bag.
    ///
    /// # Errors
    ///
    /// Returns the first [`DispatchError::InvalidArgument`] in declaration order.
    pub fn validate(&self, params: &[ParamSpec]) -> Result<(), DispatchError> {
        for param in params {
            match (param.kind, param.required) {
                (ParamKind::Text, false) => self.text(param.key).map(|_| ())?,
                (ParamKind::Text, true) => self.required_text(param.key).map(|_| ())?,
                (ParamKind::Amount, false) => self.amount(param.key).map(|_| ())?,
                (ParamKind::Amount, true) => self.required_amount(param.key).map(|_| ())?,
            }
        }
        Ok(())
    }
}

/// Case-insensitive substring match used by every text filter.
#[must_use]
pub fn matches_filter(value: &str, filter: Option<&str>) -> bool {
    filter.is_none_or(|needle| value.to_lowercase().contains(&needle.to_lowercase()))
}

/// JSON type label for error messages.
const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
