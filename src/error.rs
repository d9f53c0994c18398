//! Error types for the filerisk scanning pipeline.
//!
//! Only input errors are fatal to a scan. Every other variant is produced inside a
//! single signal component and downgraded there into that component's outcome
//! (a warning, an error marker or a partial result), so it never reaches the
//! caller of [`crate::pipeline::Scanner::scan`].

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for filerisk operations.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The input file could not be opened or read.
    #[error("cannot read input {path:?}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input file exceeds the configured size ceiling.
    #[error("input too large: {size} bytes exceeds the configured io.max_file_size of {limit} bytes")]
    InputTooLarge { size: u64, limit: u64 },

    /// An optional parser or tool is not present in this build or environment.
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// An external detection engine could not be launched or its output parsed.
    #[error("{engine} error: {message}")]
    ExternalEngine { engine: String, message: String },

    /// A recognized container turned out to be malformed.
    #[error("format parse error: {0}")]
    FormatParse(String),

    /// A bounded operation ran past its deadline.
    #[error("operation '{operation}' timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    /// A bounded operation was cancelled by the scan.
    #[error("operation '{0}' cancelled")]
    Cancelled(String),

    /// Configuration values are inconsistent or could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for filerisk operations
pub type Result<T> = std::result::Result<T, ScanError>;

impl ScanError {
    /// Create an input error with path context.
    pub fn input(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Input {
            path: path.into(),
            source,
        }
    }

    /// Create an external engine error.
    pub fn engine(engine: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalEngine {
            engine: engine.into(),
            message: message.into(),
        }
    }

    /// Whether this error aborts the whole scan.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Input { .. } | Self::InputTooLarge { .. })
    }
}

/// Shorten a diagnostic message to at most `max_chars` characters.
///
/// Engine stderr can be arbitrarily long; reports carry only the head of it.
pub fn truncate_message(message: &str, max_chars: usize) -> String {
    let trimmed = message.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
