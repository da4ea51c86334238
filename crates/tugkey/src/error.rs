//! Unified error type for tugkey CLI output.
//!
//! Every failure a command can hit is converted to [`CliError`] before it is
//! rendered as a JSON error response. [`OutputErrorCode`] gives each error a
//! stable numeric code that doubles as the process exit code.

use std::fmt;

use thiserror::Error;
use tugkey_core::error::{EncodingError, GraphError, ResolveError};

// ============================================================================
// Error Codes
// ============================================================================

/// Error codes for JSON output and process exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from the caller (bad entity id, unreadable graph file).
    InvalidArguments = 2,
    /// Resolution errors (entity cannot be keyed, key not found or ambiguous,
    /// round-trip failures).
    ResolutionError = 3,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Error type for CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid arguments from the caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// The graph file could not be read or parsed.
    #[error("cannot load graph {path}: {message}")]
    GraphLoad { path: String, message: String },

    /// The requested entity id is not in the graph.
    #[error("entity {id} not found in graph")]
    EntityNotFound { id: String },

    /// The entity exists but cannot be keyed.
    #[error("cannot encode entity: {0}")]
    Encoding(#[from] EncodingError),

    /// Exact resolution was requested and the key did not name one entity.
    #[error("key did not resolve exactly: {0}")]
    Unresolved(#[from] ResolveError),

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl CliError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        CliError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create a graph load error.
    pub fn graph_load(path: impl Into<String>, err: GraphError) -> Self {
        CliError::GraphLoad {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        CliError::InternalError {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

impl From<&CliError> for OutputErrorCode {
    fn from(err: &CliError) -> Self {
        match err {
            CliError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            CliError::GraphLoad { .. } => OutputErrorCode::InvalidArguments,
            CliError::EntityNotFound { .. } => OutputErrorCode::InvalidArguments,
            CliError::Encoding(_) => OutputErrorCode::ResolutionError,
            CliError::Unresolved(_) => OutputErrorCode::ResolutionError,
            CliError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::internal(format!("IO error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tugkey_core::{EntityId, EntityKind};

    mod error_code_mapping {
        use super::*;

        #[test]
        fn argument_errors_map_to_2() {
            assert_eq!(CliError::invalid_args("x").error_code().code(), 2);
            let err = CliError::EntityNotFound {
                id: "ent_9".to_string(),
            };
            assert_eq!(err.error_code(), OutputErrorCode::InvalidArguments);
        }

        #[test]
        fn resolution_errors_map_to_3() {
            let err = CliError::from(ResolveError::Ambiguous { count: 2 });
            assert_eq!(err.error_code().code(), 3);

            let err = CliError::from(EncodingError::UnsupportedKind {
                id: EntityId::new(1),
                kind: EntityKind::Local,
            });
            assert_eq!(err.error_code(), OutputErrorCode::ResolutionError);
        }

        #[test]
        fn internal_errors_map_to_10() {
            let err = CliError::from(std::io::Error::other("disk"));
            assert_eq!(err.error_code().code(), 10);
            assert_eq!(err.to_string(), "internal error: IO error: disk");
        }
    }
}
