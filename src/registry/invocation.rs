//! Invocation table plumbing: parameter specs, realized parameters and the
//! handler signature shared by functions and operators.

use crate::ast::ExpressionNode;
use crate::evaluator::{EvalResult, EvaluationContext};
use crate::model::{Collection, TypeInfo};

/// How an argument is handed to a handler.
///
/// `Expr` arguments stay unevaluated so the handler can rebind `$this` per
/// item; `AnyAtRoot` arguments evaluate against the document root (needed by
/// set operations whose right side is an absolute path); the typed variants
/// evaluate eagerly and enforce a singleton of that type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSpec {
    Expr,
    AnyAtRoot,
    Any,
    TypeSpecifier,
    String,
    Integer,
    Number,
    MaybeBoolean,
}

impl ParamSpec {
    pub(crate) fn expected_name(self) -> &'static str {
        match self {
            ParamSpec::String => "String",
            ParamSpec::Integer => "Integer",
            ParamSpec::Number => "Integer or Decimal",
            ParamSpec::MaybeBoolean => "Boolean",
            ParamSpec::TypeSpecifier => "type specifier",
            ParamSpec::Expr | ParamSpec::AnyAtRoot | ParamSpec::Any => "expression",
        }
    }
}

/// A realized argument as seen by a handler.
pub enum Param<'a> {
    /// Deferred expression, evaluated by the handler via `eval_lambda`.
    Expr(&'a ExpressionNode),
    /// Eagerly evaluated collection.
    Value(Collection),
    /// Parsed type specifier.
    Type(TypeInfo),
}

impl Param<'_> {
    /// True for an eagerly evaluated argument that came out empty; nullable
    /// invocations short-circuit on these.
    pub fn is_empty_value(&self) -> bool {
        matches!(self, Param::Value(v) if v.is_empty())
    }

    pub fn collection(&self) -> &[crate::model::FhirPathValue] {
        match self {
            Param::Value(v) => v,
            _ => &[],
        }
    }

    pub fn expr(&self) -> Option<&ExpressionNode> {
        match self {
            Param::Expr(e) => Some(e),
            _ => None,
        }
    }

    pub fn type_info(&self) -> Option<&TypeInfo> {
        match self {
            Param::Type(t) => Some(t),
            _ => None,
        }
    }
}

pub type Handler = fn(&mut EvaluationContext, Collection, &[Param]) -> EvalResult<Collection>;

/// One entry in the invocation table.
pub struct Invocation {
    pub handler: Handler,
    /// Accepted signatures, selected by argument count.
    pub signatures: &'static [&'static [ParamSpec]],
    /// Nullable invocations return empty when the input (functions only) or
    /// any eager argument is empty, without running the handler.
    pub nullable: bool,
}
