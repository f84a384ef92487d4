//! Error types shared across Steadyhand crates.

use std::path::PathBuf;

/// Top-level error type for Steadyhand operations.
#[derive(Debug, thiserror::Error)]
pub enum SteadyError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Input source error: {message}")]
    InputSource { message: String },

    #[error("Output adapter error: {message}")]
    Output { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using SteadyError.
pub type SteadyResult<T> = Result<T, SteadyError>;

impl SteadyError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn input_source(msg: impl Into<String>) -> Self {
        Self::InputSource {
            message: msg.into(),
        }
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self::Output {
            message: msg.into(),
        }
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_message() {
        let err = SteadyError::config("smoothing_factor must be in (0, 1]");
        assert_eq!(
            err.to_string(),
            "Configuration error: smoothing_factor must be in (0, 1]"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: SteadyError = io.into();
        assert!(matches!(err, SteadyError::Io(_)));
    }
}
