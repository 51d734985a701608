//! FHIRPath expression evaluator
//!
//! A tree-walking interpreter over the parsed AST. Every sub-expression
//! produces an ordered collection; emptiness propagates through operators
//! and nullable functions, and lambda-style macros rebind `$this`/`$index`/
//! `$total` through an explicit frame stack.

mod context;
mod engine;
mod error;

pub use context::EvaluationContext;
pub use engine::FhirPathEngine;
pub use error::{EvalResult, EvaluationError};
