//! Error types for the save validation pipeline.
//!
//! Every failure a run can hit maps to one variant of [`CareerSaveError`].
//! Fatal errors abort the run; `PersistFailed` is carried next to the report
//! so callers still get the validated data when the snapshot cannot be written.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for careersave operations.
#[derive(Debug, Error)]
pub enum CareerSaveError {
    /// The save file does not exist at the resolved path
    #[error("Save file not found at: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// Reading the save file failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The external decoder reported an error
    #[error("Save decoding failed: {context}")]
    Decode {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The external decoder did not finish in time
    #[error("Save decoding timed out after {}s", timeout.as_secs_f64())]
    DecodeTimeout { timeout: std::time::Duration },

    /// Decoder output is neither a table set nor an array of table sets
    #[error("Malformed fragment: {description}")]
    MalformedFragment { description: String },

    /// Identity check target table is absent from the merged set
    #[error("Table not found: {table}")]
    TableNotFound { table: String },

    /// The merged table set was validated but could not be saved
    #[error("Failed to persist snapshot to {}", path.display())]
    PersistFailed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Convenience type alias for Results with CareerSaveError
pub type Result<T> = std::result::Result<T, CareerSaveError>;

impl CareerSaveError {
    /// Creates a decode error with context
    pub fn decode_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Decode {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates a malformed fragment error describing the offending shape
    pub fn malformed(description: impl Into<String>) -> Self {
        Self::MalformedFragment {
            description: description.into(),
        }
    }

    /// Creates a table-not-found error
    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
        }
    }

    /// Creates a persist error for the given snapshot path
    pub fn persist_failed<E>(path: impl Into<PathBuf>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::PersistFailed {
            path: path.into(),
            source: Box::new(error),
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns true for errors raised before a merged table set existed.
    ///
    /// These are the failures for which decoder troubleshooting hints apply.
    pub fn is_decode_stage(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::DecodeTimeout { .. } | Self::MalformedFragment { .. }
        )
    }
}
