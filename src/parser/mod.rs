//! FHIRPath expression parser
//!
//! A hand-rolled tokenizer plus Pratt parser. The parser is the external
//! boundary of the evaluation core: it turns expression text into the
//! [`ExpressionNode`](crate::ast::ExpressionNode) AST and reports malformed
//! input as [`ParseError`] without ever panicking.

mod error;
mod pratt;
mod tokenizer;

pub use error::{ParseError, ParseResult};
pub use pratt::Parser;
pub use tokenizer::{Token, Tokenizer};

use crate::ast::ExpressionNode;

/// Parse a FHIRPath expression into an AST.
pub fn parse(expression: &str) -> ParseResult<ExpressionNode> {
    Parser::new(expression)?.parse()
}
