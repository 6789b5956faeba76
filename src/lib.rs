//! Fastly SetDiff
//!
//! Keyed set reconciliation for the nested blocks of Fastly provider
//! resources.
//!
//! # Overview
//!
//! A Fastly service version owns collections of nested objects: backends,
//! domains, headers, dozens of logging endpoint kinds. Terraform hands the
//! provider these collections as unordered sets, while the Fastly API only
//! offers per-object create, update and delete calls. This crate bridges the
//! two:
//!
//! - **RecordSet**: an unordered collection of JSON records with structural equality
//! - **SetDiff**: splits an old and a new set into added, modified, deleted and
//!   unmodified records, matching records by a caller-supplied key function
//! - **Filter**: reduces a modified record to the fields that actually changed
//! - **NestedBlockHandler / apply_diff**: turns a diff into one remote call per block
//! - **Testing**: an in-memory recording handler and diff assertions
//! - **Logging**: `tracing` integration writing to stderr
//!
//! # Quick Start
//!
//! ```
//! use fastly_setdiff::{RecordSet, SetDiff};
//! use serde_json::json;
//!
//! let old: RecordSet = vec![
//!     json!({"name": "name-a", "value": "value-a"}),
//!     json!({"name": "b", "value": "value-b"}),
//!     json!({"name": "name-d", "value": "value-d"}),
//! ].into();
//! let new: RecordSet = vec![
//!     json!({"name": "name-a", "value": "value-a-new"}),
//!     json!({"name": "name-c", "value": "value-c"}),
//!     json!({"name": "name-d", "value": "value-d"}),
//! ].into();
//!
//! let differ = SetDiff::by_field("name");
//! let result = differ.diff(&old, &new)?;
//!
//! assert_eq!(result.to_string(), "1 to add, 1 to change, 1 to destroy");
//! assert!(result.modified.contains(&json!({"name": "name-a", "value": "value-a-new"})));
//!
//! let changes = differ.filter(&json!({"name": "name-a", "value": "value-a-new"}), &old)?;
//! assert_eq!(changes, json!({"value": "value-a-new"}));
//! # Ok::<(), fastly_setdiff::SetDiffError>(())
//! ```
//!
//! # Identity
//!
//! Records are matched by key, compared by content. A record whose key field
//! changes is therefore reported as one deletion and one addition, never as a
//! modification. Pick a key that is immutable for the remote object, which
//! for Fastly is almost always `name`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod apply;
pub mod config;
pub mod error;
pub mod logging;
pub mod set;
pub mod setdiff;
pub mod testing;
pub mod types;

// Re-export main types at crate root
pub use apply::{apply_diff, ApplySummary, NestedBlockHandler};
pub use config::{DiffOptions, DuplicateKeys};
pub use error::{BoxError, Result, SetDiffError};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use set::{Record, RecordSet};
pub use setdiff::{DiffResult, SetDiff};
pub use types::{ChangeKind, RecordChange};

// Re-export async_trait for handler implementations
pub use async_trait::async_trait;

pub use serde_json;
pub use tracing;
