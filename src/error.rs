//! Error types for the ximl library.
//!
//! All failures are represented by [`XimlError`]. Callers that process
//! batches of documents usually care about *when* an error can happen rather
//! than its exact variant, so every error also maps onto an [`ErrorKind`]:
//!
//! - [`ErrorKind::Config`]: the model or configuration itself is unusable.
//!   These are raised while loading, before any numeric work starts.
//! - [`ErrorKind::Data`]: the model is fine but one input record is not.
//!   A batch caller may skip the record or abort.
//! - [`ErrorKind::Caught`]: a lower-level I/O or parsing failure, wrapped with
//!   the original message.
//!
//! # Examples
//!
//! ```
//! use ximl::error::{ErrorKind, Result, XimlError};
//!
//! fn check_width(features: &[f32]) -> Result<()> {
//!     if features.len() != 3 {
//!         return Err(XimlError::data("expected 3 features"));
//!     }
//!     Ok(())
//! }
//!
//! let err = check_width(&[1.0]).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Data);
//! ```

use std::io;

use thiserror::Error;

/// The main error type for ximl operations.
#[derive(Error, Debug)]
pub enum XimlError {
    /// Malformed or structurally invalid configuration / model input.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Valid configuration but invalid runtime data.
    #[error("Data error: {0}")]
    Data(String),

    /// A lower-level failure re-raised with context.
    #[error("Caught exception: {0}")]
    Caught(String),

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with XimlError.
pub type Result<T> = std::result::Result<T, XimlError>;

/// Coarse classification of an error, used to pick a batch policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Data,
    Caught,
}

impl XimlError {
    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        XimlError::Config(msg.into())
    }

    /// Create a new data error.
    pub fn data<S: Into<String>>(msg: S) -> Self {
        XimlError::Data(msg.into())
    }

    /// Wrap a lower-level error, keeping its message.
    pub fn caught<S: Into<String>, E: std::fmt::Display>(context: S, err: E) -> Self {
        XimlError::Caught(format!("{}: {err}", context.into()))
    }

    /// The error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            XimlError::Config(_) => ErrorKind::Config,
            XimlError::Data(_) => ErrorKind::Data,
            XimlError::Caught(_) | XimlError::Io(_) | XimlError::Json(_) => ErrorKind::Caught,
        }
    }

    /// Whether a batch may continue past this error.
    pub fn is_per_record(&self) -> bool {
        self.kind() == ErrorKind::Data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = XimlError::config("unknown model 'SVM'");
        assert_eq!(
            error.to_string(),
            "Configuration error: unknown model 'SVM'"
        );

        let error = XimlError::data("document must contain 3 features");
        assert_eq!(error.to_string(), "Data error: document must contain 3 features");

        let error = XimlError::caught("reading 'model.json'", "unexpected EOF");
        assert_eq!(
            error.to_string(),
            "Caught exception: reading 'model.json': unexpected EOF"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(XimlError::config("x").kind(), ErrorKind::Config);
        assert_eq!(XimlError::data("x").kind(), ErrorKind::Data);
        assert!(XimlError::data("x").is_per_record());
        assert!(!XimlError::config("x").is_per_record());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let ximl_error = XimlError::from(io_error);

        match ximl_error {
            XimlError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
        assert_eq!(
            XimlError::from(io::Error::other("boom")).kind(),
            ErrorKind::Caught
        );
    }
}
