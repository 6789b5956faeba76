//! Reconciler options.
//!
//! Options can be built in code or read from the provider configuration:
//!
//! ```
//! use fastly_setdiff::{DiffOptions, DuplicateKeys};
//! use serde_json::json;
//!
//! let options = DiffOptions::from_value(json!({"duplicate_keys": "reject"})).unwrap();
//! assert_eq!(options.duplicate_keys, DuplicateKeys::Reject);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, SetDiffError};

/// What to do when two records in one collection share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeys {
    /// The record iterated last wins the key lookup.
    #[default]
    LastWins,
    /// Fail the diff with [`SetDiffError::DuplicateKey`].
    Reject,
}

/// Options for a [`SetDiff`](crate::SetDiff).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct DiffOptions {
    /// Policy for duplicate keys within a single collection.
    pub duplicate_keys: DuplicateKeys,
}

impl DiffOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duplicate key policy.
    pub fn with_duplicate_keys(mut self, policy: DuplicateKeys) -> Self {
        self.duplicate_keys = policy;
        self
    }

    /// Read options from a JSON configuration block.
    ///
    /// A null value yields the defaults.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value).map_err(|e| SetDiffError::Configuration(e.to_string()))
    }
}
