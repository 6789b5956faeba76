//! Driving API calls from a diff.
//!
//! A provider resource that owns a set of nested blocks implements
//! [`NestedBlockHandler`] for each block type: one call to create a block, one
//! to update it, one to delete it. [`apply_diff`] then turns a [`DiffResult`]
//! into those calls.
//!
//! Calls are made one at a time. Deletes go first so that a block renamed in
//! place never collides with itself on the remote side, then creates, then
//! updates. The first failure stops the run.
//!
//! # Example
//!
//! ```ignore
//! use fastly_setdiff::{apply_diff, NestedBlockHandler, Record, SetDiff, SetDiffError};
//!
//! struct SyslogEndpoints { client: FastlyClient, service: String, version: i32 }
//!
//! #[async_trait::async_trait]
//! impl NestedBlockHandler for SyslogEndpoints {
//!     async fn create(&self, record: &Record) -> Result<(), SetDiffError> {
//!         self.client.create_syslog(&self.service, self.version, record).await
//!     }
//!
//!     async fn update(&self, record: &Record, changes: &Record) -> Result<(), SetDiffError> {
//!         self.client.update_syslog(&self.service, self.version, &record["name"], changes).await
//!     }
//!
//!     async fn delete(&self, record: &Record) -> Result<(), SetDiffError> {
//!         self.client.delete_syslog(&self.service, self.version, &record["name"]).await
//!     }
//! }
//!
//! let differ = SetDiff::by_field("name");
//! let result = differ.diff(&old, &new)?;
//! let summary = apply_diff(&differ, &handler, &old, &result).await?;
//! ```

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::{Result, SetDiffError};
use crate::set::{Record, RecordSet};
use crate::setdiff::{DiffResult, SetDiff};

/// Remote operations for one kind of nested block.
#[async_trait::async_trait]
pub trait NestedBlockHandler: Send + Sync {
    /// Create a block that is new in the configuration.
    async fn create(&self, record: &Record) -> Result<()>;

    /// Update a block in place.
    ///
    /// `record` is the full desired block. `changes` holds only the fields
    /// that differ from the prior state, for APIs with partial updates.
    async fn update(&self, record: &Record, changes: &Record) -> Result<()>;

    /// Delete a block that is gone from the configuration.
    async fn delete(&self, record: &Record) -> Result<()>;
}

/// Counts of the calls made by [`apply_diff`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplySummary {
    /// Blocks created.
    pub created: usize,
    /// Blocks updated.
    pub updated: usize,
    /// Blocks deleted.
    pub deleted: usize,
    /// Blocks left untouched.
    pub unchanged: usize,
}

impl ApplySummary {
    /// Total number of remote calls made.
    pub fn total_calls(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

impl fmt::Display for ApplySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} changed, {} destroyed",
            self.created, self.updated, self.deleted
        )
    }
}

/// Issue one delete per deleted record, one create per added record and one
/// update per modified record, in that order.
///
/// `old` is the prior collection the diff was computed from. It is used to
/// reduce each modified record to its changed fields via [`SetDiff::filter`].
#[instrument(skip_all, fields(changes = result.total_changes()))]
pub async fn apply_diff<K, H>(
    differ: &SetDiff<K>,
    handler: &H,
    old: &RecordSet,
    result: &DiffResult,
) -> Result<ApplySummary>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync,
    H: NestedBlockHandler + ?Sized,
{
    let mut summary = ApplySummary {
        unchanged: result.unmodified.len(),
        ..ApplySummary::default()
    };

    if !result.has_changes() {
        debug!("No nested block changes to apply");
        return Ok(summary);
    }

    for record in &result.deleted {
        debug!(%record, "Deleting nested block");
        handler
            .delete(record)
            .await
            .map_err(|e| SetDiffError::apply("delete", record, e))?;
        summary.deleted += 1;
    }

    for record in &result.added {
        debug!(%record, "Creating nested block");
        handler
            .create(record)
            .await
            .map_err(|e| SetDiffError::apply("create", record, e))?;
        summary.created += 1;
    }

    for record in &result.modified {
        let changes = differ.filter(record, old)?;
        debug!(%record, %changes, "Updating nested block");
        handler
            .update(record, &changes)
            .await
            .map_err(|e| SetDiffError::apply("update", record, e))?;
        summary.updated += 1;
    }

    info!(
        created = summary.created,
        updated = summary.updated,
        deleted = summary.deleted,
        unchanged = summary.unchanged,
        "Applied nested block changes"
    );
    Ok(summary)
}
