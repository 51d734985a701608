//! Top-level error type for expression evaluation

use thiserror::Error;

/// Error returned by the high-level [`FhirPathEngine`](crate::FhirPathEngine)
/// entry points, covering both parse and evaluation failures.
///
/// Parse errors propagate unchanged so callers can distinguish a malformed
/// expression from an expression that failed at evaluation time.
#[derive(Error, Debug)]
pub enum FhirPathError {
    /// The expression text could not be parsed
    #[error(transparent)]
    Parse(#[from] crate::parser::ParseError),

    /// The expression parsed but failed during evaluation
    #[error(transparent)]
    Evaluation(#[from] crate::evaluator::EvaluationError),
}
