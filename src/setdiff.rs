//! Keyed set reconciliation for nested blocks.
//!
//! Remote APIs such as Fastly's expose nested blocks (logging endpoints,
//! backends, headers...) as individual objects with no bulk "replace set"
//! call. [`SetDiff`] compares the prior and desired collections of such a
//! block and sorts every record into one of four buckets, so the caller can
//! issue exactly one create, update or delete per block.
//!
//! Identity is decided by a key function. Content is compared structurally.
//!
//! ```
//! use fastly_setdiff::{RecordSet, SetDiff};
//! use serde_json::json;
//!
//! let old: RecordSet = vec![
//!     json!({"name": "syslog", "port": 514}),
//!     json!({"name": "s3", "bucket": "logs"}),
//! ].into();
//! let new: RecordSet = vec![
//!     json!({"name": "syslog", "port": 6514}),
//!     json!({"name": "bigquery", "dataset": "cdn"}),
//! ].into();
//!
//! let result = SetDiff::by_field("name").diff(&old, &new).unwrap();
//! assert_eq!(result.added.into_vec(), vec![json!({"name": "bigquery", "dataset": "cdn"})]);
//! assert_eq!(result.modified.into_vec(), vec![json!({"name": "syslog", "port": 6514})]);
//! assert_eq!(result.deleted.into_vec(), vec![json!({"name": "s3", "bucket": "logs"})]);
//! assert!(result.unmodified.is_empty());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, trace};

use crate::config::{DiffOptions, DuplicateKeys};
use crate::error::{BoxError, Result, SetDiffError};
use crate::set::{Record, RecordSet};
use crate::types::RecordChange;

type KeyFn<K> = dyn Fn(&Record) -> std::result::Result<Option<K>, BoxError> + Send + Sync;

/// Computes added, modified, deleted and unmodified records between two sets.
pub struct SetDiff<K> {
    key_fn: Box<KeyFn<K>>,
    options: DiffOptions,
}

/// The outcome of [`SetDiff::diff`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Records in the new set whose key is absent from the old set.
    pub added: RecordSet,
    /// New versions of records whose key exists in the old set with other content.
    pub modified: RecordSet,
    /// Records in the old set whose key is absent from the new set.
    pub deleted: RecordSet,
    /// Records present, identically, in both sets.
    pub unmodified: RecordSet,
}

impl<K> SetDiff<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// Create a reconciler from a key function.
    ///
    /// The function returns `Ok(None)` when a record has no usable key. Both
    /// that and an error abort [`diff`](Self::diff).
    pub fn new<F>(key_fn: F) -> Self
    where
        F: Fn(&Record) -> std::result::Result<Option<K>, BoxError> + Send + Sync + 'static,
    {
        Self {
            key_fn: Box::new(key_fn),
            options: DiffOptions::default(),
        }
    }

    /// Replace the reconciler's options.
    pub fn with_options(mut self, options: DiffOptions) -> Self {
        self.options = options;
        self
    }

    /// The options in effect.
    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// Compute the key of a single record.
    pub fn key(&self, record: &Record) -> Result<K> {
        match (self.key_fn)(record) {
            Ok(Some(key)) => Ok(key),
            Ok(None) => Err(SetDiffError::missing_key(record)),
            Err(source) => Err(SetDiffError::key_computation(record, source)),
        }
    }

    /// Classify the records of `old` and `new`.
    ///
    /// Fails without a partial result if any record in either set has no key.
    /// A record whose key changes shows up as one deletion plus one addition.
    #[instrument(level = "debug", skip_all, fields(old = old.len(), new = new.len()))]
    pub fn diff(&self, old: &RecordSet, new: &RecordSet) -> Result<DiffResult> {
        let old_by_key = self.lookup(old)?;
        let new_by_key = self.lookup(new)?;

        let mut result = DiffResult::default();

        for record in new.difference(old) {
            let key = self.key(&record)?;
            if old_by_key.contains_key(&key) {
                debug!(?key, "Record modified");
                result.modified.insert(record);
            } else {
                debug!(?key, "Record added");
                result.added.insert(record);
            }
        }

        for record in old.difference(new) {
            let key = self.key(&record)?;
            if new_by_key.contains_key(&key) {
                // Old half of a modified pair.
                continue;
            }
            debug!(?key, "Record deleted");
            result.deleted.insert(record);
        }

        result.unmodified = old.intersection(new);

        debug!(
            added = result.added.len(),
            modified = result.modified.len(),
            deleted = result.deleted.len(),
            unmodified = result.unmodified.len(),
            "Computed set diff"
        );
        Ok(result)
    }

    /// Reduce a modified record to the fields that changed.
    ///
    /// The old record is the first one in `old` sharing the modified record's
    /// key. Fields whose value equals the old value are dropped. If nothing in
    /// `old` matches, the record is returned whole.
    pub fn filter(&self, modified: &Record, old: &RecordSet) -> Result<Record> {
        let Value::Object(fields) = modified else {
            return Ok(modified.clone());
        };

        let key = self.key(modified)?;
        let mut previous = None;
        for candidate in old {
            if self.key(candidate)? == key {
                previous = Some(candidate);
                break;
            }
        }

        let Some(Value::Object(previous)) = previous else {
            trace!(?key, "No previous record, sending every field");
            return Ok(modified.clone());
        };

        let changed: serde_json::Map<String, Value> = fields
            .iter()
            .filter(|(name, value)| previous.get(name.as_str()) != Some(*value))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        trace!(?key, fields = changed.len(), "Filtered modified record");
        Ok(Value::Object(changed))
    }

    fn lookup<'a>(&self, set: &'a RecordSet) -> Result<HashMap<K, &'a Record>> {
        let mut by_key = HashMap::with_capacity(set.len());
        for record in set {
            let key = self.key(record)?;
            if by_key.contains_key(&key) && self.options.duplicate_keys == DuplicateKeys::Reject {
                return Err(SetDiffError::DuplicateKey {
                    key: format!("{:?}", key),
                    record: record.to_string(),
                });
            }
            by_key.insert(key, record);
        }
        Ok(by_key)
    }
}

impl<K> SetDiff<K>
where
    K: Eq + Hash + Clone + fmt::Debug + fmt::Display,
{
    /// Describe a diff as one [`RecordChange`] per record, sorted by key.
    ///
    /// Modified entries carry the old record from `old` as `before`.
    pub fn changes(&self, old: &RecordSet, result: &DiffResult) -> Result<Vec<RecordChange>> {
        let old_by_key = self.lookup(old)?;
        let mut changes = Vec::with_capacity(result.len());

        for record in &result.added {
            let key = self.key(record)?;
            changes.push(RecordChange::created(key.to_string(), record.clone()));
        }
        for record in &result.modified {
            let key = self.key(record)?;
            let before = old_by_key.get(&key).map(|r| (*r).clone());
            changes.push(RecordChange::updated(key.to_string(), before, record.clone()));
        }
        for record in &result.deleted {
            let key = self.key(record)?;
            changes.push(RecordChange::deleted(key.to_string(), record.clone()));
        }
        for record in &result.unmodified {
            let key = self.key(record)?;
            changes.push(RecordChange::unchanged(key.to_string(), record.clone()));
        }

        changes.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(changes)
    }
}

impl SetDiff<String> {
    /// Key records by a top-level field, as most Fastly nested blocks are keyed by `name`.
    ///
    /// A missing field, a null or an empty string counts as no key. String
    /// values are used as-is; other values by their JSON text.
    pub fn by_field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(move |record| Ok(field_key(record, &field)))
    }
}

impl<K> fmt::Debug for SetDiff<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetDiff")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn field_key(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl DiffResult {
    /// Returns true if anything has to be created, updated or deleted.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.modified.is_empty() || !self.deleted.is_empty()
    }

    /// Number of records that need an API call.
    pub fn total_changes(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len()
    }

    /// Number of records across all four buckets.
    pub fn len(&self) -> usize {
        self.total_changes() + self.unmodified.len()
    }

    /// Returns true if all four buckets are empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for DiffResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to add, {} to change, {} to destroy",
            self.added.len(),
            self.modified.len(),
            self.deleted.len()
        )
    }
}
