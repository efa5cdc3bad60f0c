//! Error types for memoize
//!
//! All modules use `MemoizeResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for memoize operations
pub type MemoizeResult<T> = Result<T, MemoizeError>;

/// All errors that can occur in memoize
///
/// A failing traced command is not an error: its exit code is returned
/// normally. These variants cover everything that stops the tool itself.
#[derive(Error, Debug)]
pub enum MemoizeError {
    // Tracer errors
    #[error("Tracer not found: {program}")]
    TracerNotFound { program: String },

    #[error("Failed to start tracer {program}")]
    TracerSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read trace capture {path}")]
    TracerCapture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MemoizeError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a tracer spawn error, mapping a missing binary to `TracerNotFound`
    pub fn tracer_spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        let program = program.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::TracerNotFound { program }
        } else {
            Self::TracerSpawn { program, source }
        }
    }

    /// Whether this error means the tool is misconfigured rather than broken mid-run
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::TracerNotFound { .. }
                | Self::TracerSpawn { .. }
                | Self::ConfigInvalid { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::TracerNotFound { .. } => {
                Some("Install strace (e.g. apt install strace) or set tracer.program in config")
            }
            Self::TracerSpawn { .. } => Some("Check that the tracer binary is executable"),
            Self::ConfigInvalid { .. } => Some("Fix or remove the offending config file"),
            _ => None,
        }
    }
}
