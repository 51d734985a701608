//! Operator definitions for binary and unary expressions

use std::fmt;

/// Binary operators, in invocation-table spelling order.
///
/// Each operator dispatches through the invocation table under the token
/// returned by [`BinaryOperator::as_str`], so adding an operator means adding
/// both a variant here and a table entry in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// Equality (`=`)
    Equal,
    /// Inequality (`!=`)
    NotEqual,
    /// Equivalence (`~`)
    Equivalent,
    /// Non-equivalence (`!~`)
    NotEquivalent,
    /// Less than (`<`)
    LessThan,
    /// Less than or equal (`<=`)
    LessThanOrEqual,
    /// Greater than (`>`)
    GreaterThan,
    /// Greater than or equal (`>=`)
    GreaterThanOrEqual,
    /// Collection union (`|`)
    Union,
    /// Addition / string concatenation (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Multiplication (`*`)
    Multiply,
    /// Decimal division (`/`)
    Divide,
    /// Integer division (`div`)
    IntegerDivide,
    /// Modulo (`mod`)
    Modulo,
    /// String concatenation treating empty as `''` (`&`)
    Concatenate,
    /// Membership (`in`)
    In,
    /// Containership (`contains`)
    Contains,
    /// Logical and
    And,
    /// Logical or
    Or,
    /// Logical xor
    Xor,
    /// Logical implication
    Implies,
}

impl BinaryOperator {
    /// The invocation-table key for this operator.
    ///
    /// `in` and `contains` are aliased the way the evaluation table aliases
    /// membership expressions, so they do not collide with the `contains()`
    /// string function.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Equivalent => "~",
            BinaryOperator::NotEquivalent => "!~",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::Union => "|",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::IntegerDivide => "div",
            BinaryOperator::Modulo => "mod",
            BinaryOperator::Concatenate => "&",
            BinaryOperator::In => "inOp",
            BinaryOperator::Contains => "containsOp",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::Xor => "xor",
            BinaryOperator::Implies => "implies",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOperator::In => f.write_str("in"),
            BinaryOperator::Contains => f.write_str("contains"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Unary (polarity) operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// Unary plus
    Plus,
    /// Unary minus
    Minus,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Plus => f.write_str("+"),
            UnaryOperator::Minus => f.write_str("-"),
        }
    }
}
