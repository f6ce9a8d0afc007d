//! Error types for the textcat library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`TextcatError`] enum.
//!
//! Numeric edge cases inside the statistics (a chi-square table with a zero
//! marginal, a 0/0 precision) are resolved inline and never surface here.
//!
//! # Examples
//!
//! ```
//! use textcat::error::{Result, TextcatError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(TextcatError::invalid_argument("threshold must be finite"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for textcat operations.
#[derive(Error, Debug)]
pub enum TextcatError {
    /// I/O errors (corpus files, model files, cache files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A caller supplied an argument the operation cannot accept
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation was invoked in a state that does not allow it,
    /// e.g. predicting before a model has been trained
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The training or evaluation data cannot support the operation,
    /// e.g. a category without any sample
    #[error("Data error: {0}")]
    Data(String),

    /// Analysis-related errors (tokenizer construction, filtering)
    #[error("Analysis error: {0}")]
    Analysis(String),
}

/// Result type alias for operations that may fail with [`TextcatError`].
pub type Result<T> = std::result::Result<T, TextcatError>;

impl TextcatError {
    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        TextcatError::InvalidArgument(msg.into())
    }

    /// Create a new invalid state error.
    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        TextcatError::InvalidState(msg.into())
    }

    /// Create a new data error.
    pub fn data<S: Into<String>>(msg: S) -> Self {
        TextcatError::Data(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        TextcatError::Analysis(msg.into())
    }

    /// Create the error returned when a classifier is used before training.
    pub fn untrained() -> Self {
        TextcatError::InvalidState("model is not trained; call train() first".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = TextcatError::invalid_argument("bad rate");
        assert_eq!(error.to_string(), "Invalid argument: bad rate");

        let error = TextcatError::data("category 'sports' has no samples");
        assert_eq!(
            error.to_string(),
            "Data error: category 'sports' has no samples"
        );

        let error = TextcatError::untrained();
        assert!(matches!(error, TextcatError::InvalidState(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = TextcatError::from(io_error);

        match error {
            TextcatError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}
