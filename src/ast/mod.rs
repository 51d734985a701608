//! Abstract syntax tree for FHIRPath expressions
//!
//! The AST is produced by the parser and consumed by the evaluator. It is
//! immutable once built; a parsed expression can be evaluated any number of
//! times against different resources.

mod expression;
mod operator;

pub use expression::*;
pub use operator::*;
