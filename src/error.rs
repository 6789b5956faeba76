//! Error types for set reconciliation.

use thiserror::Error;

/// Boxed error returned by key functions and nested block handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience result alias.
pub type Result<T, E = SetDiffError> = std::result::Result<T, E>;

/// Errors that can occur while diffing or applying nested block sets.
#[derive(Debug, Error)]
pub enum SetDiffError {
    /// The key function returned an error for a record.
    #[error("Failed to compute key for record {record}: {source}")]
    KeyComputation {
        /// JSON representation of the offending record.
        record: String,
        /// The error raised by the key function.
        #[source]
        source: BoxError,
    },

    /// The key function produced no key for a record.
    #[error("Key not found for record {record}")]
    MissingKey {
        /// JSON representation of the offending record.
        record: String,
    },

    /// Two records in one collection share a key and duplicates are rejected.
    #[error("Duplicate key {key} for record {record}")]
    DuplicateKey {
        /// Debug representation of the key.
        key: String,
        /// JSON representation of the second record carrying the key.
        record: String,
    },

    /// A JSON value used as a collection is not an array.
    #[error("Not a collection: {0}")]
    NotACollection(String),

    /// Invalid reconciler options.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A nested block handler failed while applying a diff.
    #[error("Failed to {operation} record {record}: {source}")]
    Apply {
        /// The operation that failed (`create`, `update` or `delete`).
        operation: &'static str,
        /// JSON representation of the record being applied.
        record: String,
        /// The handler's error.
        #[source]
        source: Box<SetDiffError>,
    },

    /// A handler implementation reported a failure.
    #[error("Handler error: {0}")]
    Handler(String),
}

impl SetDiffError {
    /// Get the error message as a string.
    ///
    /// For variants that wrap a record, this is the record's JSON text.
    pub fn message(&self) -> &str {
        match self {
            Self::KeyComputation { record, .. } => record,
            Self::MissingKey { record } => record,
            Self::DuplicateKey { record, .. } => record,
            Self::NotACollection(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::Apply { record, .. } => record,
            Self::Handler(msg) => msg,
        }
    }

    /// Returns true if the error comes from key computation.
    pub fn is_key_error(&self) -> bool {
        matches!(
            self,
            Self::KeyComputation { .. } | Self::MissingKey { .. } | Self::DuplicateKey { .. }
        )
    }

    pub(crate) fn key_computation(record: &serde_json::Value, source: BoxError) -> Self {
        Self::KeyComputation {
            record: record.to_string(),
            source,
        }
    }

    pub(crate) fn missing_key(record: &serde_json::Value) -> Self {
        Self::MissingKey {
            record: record.to_string(),
        }
    }

    pub(crate) fn apply(
        operation: &'static str,
        record: &serde_json::Value,
        source: SetDiffError,
    ) -> Self {
        Self::Apply {
            operation,
            record: record.to_string(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_display() {
        let err = SetDiffError::missing_key(&json!({}));
        assert_eq!(format!("{}", err), "Key not found for record {}");

        let err = SetDiffError::NotACollection("object".to_string());
        assert_eq!(format!("{}", err), "Not a collection: object");

        let err = SetDiffError::Configuration("bad policy".to_string());
        assert_eq!(format!("{}", err), "Configuration error: bad policy");
    }

    #[test]
    fn test_key_computation_keeps_source() {
        let err = SetDiffError::key_computation(&json!({"value": 1}), "boom".into());
        assert_eq!(
            format!("{}", err),
            r#"Failed to compute key for record {"value":1}: boom"#
        );
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("boom"));
    }

    #[test]
    fn test_apply_error_display() {
        let err = SetDiffError::apply(
            "delete",
            &json!({"name": "a"}),
            SetDiffError::Handler("404".to_string()),
        );
        assert_eq!(
            format!("{}", err),
            r#"Failed to delete record {"name":"a"}: Handler error: 404"#
        );
        assert!(!err.is_key_error());
    }

    #[test]
    fn test_message_method() {
        let err = SetDiffError::missing_key(&json!({"value": "x"}));
        assert_eq!(err.message(), r#"{"value":"x"}"#);
        assert!(err.is_key_error());

        let err = SetDiffError::Handler("rate limited".to_string());
        assert_eq!(err.message(), "rate limited");
    }
}
