//! Evaluation-time errors

use thiserror::Error;

/// Errors raised while evaluating a parsed expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Unknown function or operator '{name}'")]
    UnknownFunction { name: String },

    #[error("Function '{name}' does not accept {arity} argument(s)")]
    InvalidArity { name: String, arity: usize },

    #[error("Undefined environment variable '%{name}'")]
    UndefinedVariable { name: String },

    #[error("Expected a collection with at most one item, got {actual}")]
    SingletonExpected { actual: usize },

    #[error("Expected a value of type {expected}, got {actual}")]
    UnexpectedType { expected: String, actual: String },

    #[error("Cannot compare {left} with {right}")]
    TypeMismatch { left: String, right: String },

    #[error("Invalid literal '{text}'")]
    InvalidLiteral { text: String },

    #[error("{message}")]
    InvalidOperation { message: String },
}

impl EvaluationError {
    pub(crate) fn invalid_operation(message: impl Into<String>) -> Self {
        EvaluationError::InvalidOperation {
            message: message.into(),
        }
    }
}

/// Result type used throughout the evaluator and function registry.
pub type EvalResult<T> = Result<T, EvaluationError>;
