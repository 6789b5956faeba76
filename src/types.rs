//! Plan-style views over a diff.
//!
//! These types describe, per key, what will happen to a nested block. They
//! are what providers log and render when showing a plan.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::set::Record;

/// What happens to one nested block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// The block is created.
    Create,
    /// The block is updated in place.
    Update,
    /// The block is deleted.
    Delete,
    /// The block is left as is.
    NoChange,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::NoChange => "no change",
        };
        write!(f, "{s}")
    }
}

/// A change to a single nested block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordChange {
    /// The block's key, as text.
    pub key: String,
    /// What happens to the block.
    pub kind: ChangeKind,
    /// The block before the change (None if creating).
    pub before: Option<Record>,
    /// The block after the change (None if deleting).
    pub after: Option<Record>,
}

impl RecordChange {
    /// Create a new record change.
    pub fn new(
        key: impl Into<String>,
        kind: ChangeKind,
        before: Option<Record>,
        after: Option<Record>,
    ) -> Self {
        Self {
            key: key.into(),
            kind,
            before,
            after,
        }
    }

    /// Create a change for a new block.
    pub fn created(key: impl Into<String>, record: Record) -> Self {
        Self::new(key, ChangeKind::Create, None, Some(record))
    }

    /// Create a change for a modified block.
    pub fn updated(key: impl Into<String>, before: Option<Record>, after: Record) -> Self {
        Self::new(key, ChangeKind::Update, before, Some(after))
    }

    /// Create a change for a removed block.
    pub fn deleted(key: impl Into<String>, record: Record) -> Self {
        Self::new(key, ChangeKind::Delete, Some(record), None)
    }

    /// Create an entry for an untouched block.
    pub fn unchanged(key: impl Into<String>, record: Record) -> Self {
        Self::new(key, ChangeKind::NoChange, Some(record.clone()), Some(record))
    }

    /// Returns true unless the block is left as is.
    pub fn is_change(&self) -> bool {
        self.kind != ChangeKind::NoChange
    }
}

impl fmt::Display for RecordChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.kind)
    }
}
