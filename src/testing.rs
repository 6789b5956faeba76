//! Testing utilities for code built on set diffs.
//!
//! This module provides an in-memory [`NestedBlockHandler`] that records the
//! calls made to it, plus assertion helpers for [`DiffResult`]s.
//!
//! # Example
//!
//! ```
//! use fastly_setdiff::testing::{assert_added, assert_unmodified, RecordingHandler};
//! use fastly_setdiff::{apply_diff, RecordSet, SetDiff};
//! use serde_json::json;
//!
//! let old: RecordSet = vec![json!({"name": "a"})].into();
//! let new: RecordSet = vec![json!({"name": "a"}), json!({"name": "b"})].into();
//!
//! let differ = SetDiff::by_field("name");
//! let result = differ.diff(&old, &new).unwrap();
//! assert_added(&result, &[json!({"name": "b"})]);
//! assert_unmodified(&result, &[json!({"name": "a"})]);
//!
//! let handler = RecordingHandler::new();
//! tokio_test::block_on(apply_diff(&differ, &handler, &old, &result)).unwrap();
//! assert_eq!(handler.created(), vec![json!({"name": "b"})]);
//! ```

use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use crate::apply::NestedBlockHandler;
use crate::error::{Result, SetDiffError};
use crate::set::{Record, RecordSet};
use crate::setdiff::DiffResult;

/// A call received by a [`RecordingHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `create(record)`
    Create(Record),
    /// `update(record, changes)`
    Update {
        /// The full desired record.
        record: Record,
        /// The filtered changes.
        changes: Record,
    },
    /// `delete(record)`
    Delete(Record),
}

/// A handler that records every successful call.
///
/// Calls on records whose `name` matches one registered with
/// [`fail_on`](Self::fail_on) fail with [`SetDiffError::Handler`] and are
/// not recorded.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    calls: Mutex<Vec<Call>>,
    failing: Vec<String>,
}

impl RecordingHandler {
    /// Create a handler that accepts every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any call on a record with this `name`.
    pub fn fail_on(mut self, name: impl Into<String>) -> Self {
        self.failing.push(name.into());
        self
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().clone()
    }

    /// Records passed to `create`.
    pub fn created(&self) -> Vec<Record> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                Call::Create(record) => Some(record.clone()),
                _ => None,
            })
            .collect()
    }

    /// Records passed to `update`, with their changes.
    pub fn updated(&self) -> Vec<(Record, Record)> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                Call::Update { record, changes } => Some((record.clone(), changes.clone())),
                _ => None,
            })
            .collect()
    }

    /// Records passed to `delete`.
    pub fn deleted(&self) -> Vec<Record> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                Call::Delete(record) => Some(record.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Call>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, operation: &str, record: &Record, call: Call) -> Result<()> {
        let name = record.get("name").and_then(Value::as_str);
        if let Some(name) = name.filter(|n| self.failing.iter().any(|f| f == n)) {
            return Err(SetDiffError::Handler(format!(
                "{} rejected for '{}'",
                operation, name
            )));
        }
        self.lock().push(call);
        Ok(())
    }
}

#[async_trait::async_trait]
impl NestedBlockHandler for RecordingHandler {
    async fn create(&self, record: &Record) -> Result<()> {
        self.record("create", record, Call::Create(record.clone()))
    }

    async fn update(&self, record: &Record, changes: &Record) -> Result<()> {
        self.record(
            "update",
            record,
            Call::Update {
                record: record.clone(),
                changes: changes.clone(),
            },
        )
    }

    async fn delete(&self, record: &Record) -> Result<()> {
        self.record("delete", record, Call::Delete(record.clone()))
    }
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert that a diff has nothing to create, update or delete.
///
/// # Panics
///
/// Panics if the diff has any changes.
pub fn assert_no_changes(result: &DiffResult) {
    assert!(
        !result.has_changes(),
        "Expected no changes, but got {}: added {:?}, modified {:?}, deleted {:?}",
        result,
        result.added.iter().collect::<Vec<_>>(),
        result.modified.iter().collect::<Vec<_>>(),
        result.deleted.iter().collect::<Vec<_>>()
    );
}

/// Assert the exact contents of the added bucket.
///
/// # Panics
///
/// Panics if the bucket differs from `expected` as a set.
pub fn assert_added(result: &DiffResult, expected: &[Record]) {
    assert_bucket("added", &result.added, expected);
}

/// Assert the exact contents of the modified bucket.
///
/// # Panics
///
/// Panics if the bucket differs from `expected` as a set.
pub fn assert_modified(result: &DiffResult, expected: &[Record]) {
    assert_bucket("modified", &result.modified, expected);
}

/// Assert the exact contents of the deleted bucket.
///
/// # Panics
///
/// Panics if the bucket differs from `expected` as a set.
pub fn assert_deleted(result: &DiffResult, expected: &[Record]) {
    assert_bucket("deleted", &result.deleted, expected);
}

/// Assert the exact contents of the unmodified bucket.
///
/// # Panics
///
/// Panics if the bucket differs from `expected` as a set.
pub fn assert_unmodified(result: &DiffResult, expected: &[Record]) {
    assert_bucket("unmodified", &result.unmodified, expected);
}

/// Assert that an error's message contains the given substring.
///
/// # Panics
///
/// Panics if the rendered error does not contain `substring`.
pub fn assert_error_contains(err: &SetDiffError, substring: &str) {
    let rendered = err.to_string();
    assert!(
        rendered.contains(substring),
        "Expected an error containing '{}', got '{}'",
        substring,
        rendered
    );
}

fn assert_bucket(bucket: &str, actual: &RecordSet, expected: &[Record]) {
    let expected: RecordSet = expected.iter().cloned().collect();
    assert!(
        *actual == expected,
        "Expected {} records {:?}, got {:?}",
        bucket,
        expected.iter().collect::<Vec<_>>(),
        actual.iter().collect::<Vec<_>>()
    );
}
