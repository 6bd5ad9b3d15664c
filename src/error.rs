//! SafeScan error types

use crate::privacy::types::PiiType;
use thiserror::Error;

/// SafeScan error type
#[derive(Error, Debug)]
pub enum Error {
    /// Input exceeds the configured byte limit
    #[error("Input too large: {size} bytes exceeds limit of {max} bytes")]
    InputTooLarge { size: usize, max: usize },

    /// Structured input nests deeper than the configured limit
    #[error("Input too deep: nesting depth {depth} exceeds limit of {max}")]
    InputTooDeep { depth: usize, max: usize },

    /// Input contains bytes that cannot be processed (NUL bytes)
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Input type is not accepted for classification
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// A pattern family exceeded its time budget and was skipped.
    ///
    /// Non-fatal: only constructed for logging, detection continues.
    #[error("Pattern timeout: {pii_type} patterns exceeded budget after {elapsed_ms} ms")]
    PatternTimeout { pii_type: PiiType, elapsed_ms: u64 },

    /// Invalid detection pattern
    #[error("Pattern error: {0}")]
    Pattern(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audit store error
    #[error("Audit error: {0}")]
    Audit(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether this error was raised by input admission checks.
    ///
    /// Validation errors are fully recoverable: the caller may retry with a
    /// smaller or cleaner input.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::InputTooLarge { .. }
                | Self::InputTooDeep { .. }
                | Self::InvalidEncoding(_)
                | Self::UnsupportedType(_)
        )
    }
}

/// Result type alias for SafeScan operations
pub type Result<T> = std::result::Result<T, Error>;
