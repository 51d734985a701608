//! Expression AST node definitions

use crate::ast::operator::{BinaryOperator, UnaryOperator};
use rust_decimal::Decimal;
use smallvec::SmallVec;

/// Argument list storage; most invocations take zero or one argument.
pub type ArgList = SmallVec<[ExpressionNode; 2]>;

/// AST representation of FHIRPath expressions.
///
/// Large variants are boxed to keep the enum small; `Path` covers the very
/// common `base.identifier` navigation, while `MethodCall` covers
/// `base.function(args)` invocations.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionNode {
    /// Literal value (string, number, boolean, temporal, quantity, `{}`)
    Literal(LiteralValue),

    /// Bare identifier: member navigation or, when capitalized, a type filter
    Identifier(String),

    /// External constant reference (`%ucum`, `%context`, ...)
    Variable(String),

    /// Implicit lambda input (`$this`)
    This,

    /// Implicit lambda position (`$index`)
    IndexVar,

    /// Implicit aggregate accumulator (`$total`)
    TotalVar,

    /// Member navigation (`base.path`)
    Path {
        /// Base expression
        base: Box<ExpressionNode>,
        /// Member name
        path: String,
    },

    /// Indexer (`base[index]`)
    Index {
        /// Base expression
        base: Box<ExpressionNode>,
        /// Index expression, evaluated against the same input as `base`
        index: Box<ExpressionNode>,
    },

    /// Function invocation at the head of an expression (`where(...)`)
    FunctionCall(Box<FunctionCallData>),

    /// Function invocation on a base expression (`base.where(...)`)
    MethodCall(Box<MethodCallData>),

    /// Binary operation
    BinaryOp(Box<BinaryOpData>),

    /// Unary polarity operation (`-x`, `+x`)
    UnaryOp {
        /// The operator
        op: UnaryOperator,
        /// The operand
        operand: Box<ExpressionNode>,
    },

    /// Type test (`value is Type`)
    TypeCheck {
        /// Expression under test
        expression: Box<ExpressionNode>,
        /// Qualified type name (`Patient`, `System.Integer`)
        type_name: String,
    },

    /// Type cast (`value as Type`); filters rather than converts
    TypeCast {
        /// Expression to cast
        expression: Box<ExpressionNode>,
        /// Qualified type name
        type_name: String,
    },
}

/// Literal values as they appear in source.
///
/// Temporal literals keep their raw text so the evaluator can derive the
/// precision that was actually written.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// The empty collection literal `{}`
    Null,
    /// `true` / `false`
    Boolean(bool),
    /// Integer literal
    Integer(i64),
    /// Decimal literal
    Decimal(Decimal),
    /// String literal, already unescaped
    String(String),
    /// Date literal without the leading `@` (`2023-01-01`, `2023`)
    Date(String),
    /// DateTime literal without the leading `@`
    DateTime(String),
    /// Time literal without the leading `@T`
    Time(String),
    /// Quantity literal: numeric value plus unit token
    Quantity {
        /// Numeric value
        value: Decimal,
        /// Unit: a quoted UCUM unit or a calendar duration word
        unit: String,
    },
}

/// Payload for [`ExpressionNode::FunctionCall`]
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallData {
    /// Function name
    pub name: String,
    /// Raw argument expressions; macros receive these unevaluated
    pub args: ArgList,
}

/// Payload for [`ExpressionNode::MethodCall`]
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCallData {
    /// Base expression providing the input collection
    pub base: ExpressionNode,
    /// Function name
    pub name: String,
    /// Raw argument expressions
    pub args: ArgList,
}

/// Payload for [`ExpressionNode::BinaryOp`]
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOpData {
    /// The operator
    pub op: BinaryOperator,
    /// Left operand
    pub left: ExpressionNode,
    /// Right operand
    pub right: ExpressionNode,
}

impl ExpressionNode {
    /// Build a binary operation node.
    pub fn binary(op: BinaryOperator, left: ExpressionNode, right: ExpressionNode) -> Self {
        ExpressionNode::BinaryOp(Box::new(BinaryOpData { op, left, right }))
    }

    /// Build a function-call node.
    pub fn function(name: impl Into<String>, args: ArgList) -> Self {
        ExpressionNode::FunctionCall(Box::new(FunctionCallData {
            name: name.into(),
            args,
        }))
    }

    /// Build a method-call node.
    pub fn method(base: ExpressionNode, name: impl Into<String>, args: ArgList) -> Self {
        ExpressionNode::MethodCall(Box::new(MethodCallData {
            base,
            name: name.into(),
            args,
        }))
    }
}
