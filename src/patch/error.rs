//! Patch-level errors.

use thiserror::Error;

use crate::evaluator::EvaluationError;
use crate::parser::ParseError;

/// Everything that can go wrong while building or applying a patch.
#[derive(Error, Debug)]
pub enum PatchError {
    /// A path expression inside an operation failed to parse.
    #[error(transparent)]
    Syntax(#[from] ParseError),

    /// A path expression failed during evaluation.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// The patch descriptor itself is malformed.
    #[error("Invalid patch: {message}")]
    InvalidPatch { message: String },

    /// The document being patched is not a usable resource.
    #[error("Invalid resource: {message}")]
    InvalidResource { message: String },

    /// A required operation field is absent.
    #[error("Operation '{op}' is missing required field '{field}'")]
    MissingField { op: String, field: &'static str },

    /// The operation type code is not one of the five supported kinds.
    #[error("Unsupported operation type '{op}'")]
    UnsupportedOperation { op: String },

    /// A non-delete operation's target path resolved to nothing.
    #[error("Path '{path}' did not resolve to a target")]
    PathNotFound { path: String },

    /// An explicit array position is outside the target array.
    #[error("Index {index} is out of bounds for '{path}'")]
    IndexOutOfBounds { index: i64, path: String },
}

impl PatchError {
    pub(crate) fn invalid_patch(message: impl Into<String>) -> Self {
        PatchError::InvalidPatch {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_resource(message: impl Into<String>) -> Self {
        PatchError::InvalidResource {
            message: message.into(),
        }
    }
}
