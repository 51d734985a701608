//! Expression dispatch and the public evaluation API.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::context::Frame;
use super::{EvalResult, EvaluationContext, EvaluationError};
use crate::ast::{ExpressionNode, LiteralValue, UnaryOperator};
use crate::error::FhirPathError;
use crate::model::{
    Collection, FhirPathValue, FpDateTime, FpTime, ModelInfo, PathStep, TypeInfo,
};
use crate::parser;
use crate::registry::{self, Param, ParamSpec};

impl EvaluationContext {
    /// Evaluates `node` against the whole resource.
    pub fn evaluate_root(&mut self, node: &ExpressionNode) -> EvalResult<Collection> {
        let input = self.root().clone();
        self.evaluate(input, node)
    }

    /// Evaluates one AST node against an input collection.
    pub fn evaluate(
        &mut self,
        input: Collection,
        node: &ExpressionNode,
    ) -> EvalResult<Collection> {
        match node {
            ExpressionNode::Literal(lit) => self.literal(lit),
            ExpressionNode::Identifier(name) => Ok(self.navigate(&input, name)),
            ExpressionNode::Variable(name) => self
                .variable(name)
                .cloned()
                .ok_or_else(|| EvaluationError::UndefinedVariable { name: name.clone() }),
            ExpressionNode::This => Ok(self.current_this()),
            ExpressionNode::IndexVar => Ok(self
                .current_index()
                .map(FhirPathValue::Integer)
                .into_iter()
                .collect()),
            ExpressionNode::TotalVar => Ok(self.current_total()),
            ExpressionNode::Path { base, path } => {
                let base_value = self.evaluate(input, base)?;
                Ok(self.navigate(&base_value, path))
            }
            ExpressionNode::Index { base, index } => {
                let collection = self.evaluate(input.clone(), base)?;
                let idx = self.evaluate(input, index)?;
                Ok(index_into(collection, &idx))
            }
            ExpressionNode::FunctionCall(data) => {
                self.invoke_function(&data.name, input, &data.args)
            }
            ExpressionNode::MethodCall(data) => {
                let base_value = self.evaluate(input, &data.base)?;
                self.invoke_function(&data.name, base_value, &data.args)
            }
            ExpressionNode::BinaryOp(data) => {
                self.invoke_operator(data.op.as_str(), input, &data.left, &data.right)
            }
            ExpressionNode::UnaryOp { op, operand } => {
                let value = self.evaluate(input, operand)?;
                apply_polarity(*op, value)
            }
            ExpressionNode::TypeCheck {
                expression,
                type_name,
            } => {
                let value = self.evaluate(input, expression)?;
                registry::functions::types::check_is(
                    &value,
                    &TypeInfo::from_specifier(type_name),
                )
            }
            ExpressionNode::TypeCast {
                expression,
                type_name,
            } => {
                let value = self.evaluate(input, expression)?;
                registry::functions::types::cast_as(value, &TypeInfo::from_specifier(type_name))
            }
        }
    }

    /// Evaluates a lambda body with fresh `$this`/`$index`/`$total` bindings.
    pub(crate) fn eval_lambda(
        &mut self,
        expr: &ExpressionNode,
        this: Collection,
        index: Option<i64>,
        total: Collection,
    ) -> EvalResult<Collection> {
        self.push_frame(Frame {
            this: this.clone(),
            index,
            total,
        });
        let result = self.evaluate(this, expr);
        self.pop_frame();
        result
    }

    /// Eagerly evaluates an argument, scoped so `$this` follows the given
    /// collection while `$index`/`$total` are inherited from the caller.
    pub(crate) fn eval_scoped(
        &mut self,
        expr: &ExpressionNode,
        scope: Collection,
    ) -> EvalResult<Collection> {
        self.push_frame(Frame {
            this: scope.clone(),
            index: self.current_index(),
            total: self.current_total(),
        });
        let result = self.evaluate(scope, expr);
        self.pop_frame();
        result
    }

    /// Member access. Capitalized names filter by node type; everything else
    /// descends into object fields, following model redirections and probing
    /// `value[x]` choice variants.
    pub(crate) fn navigate(&self, input: &Collection, key: &str) -> Collection {
        if key.starts_with(|c: char| c.is_ascii_uppercase()) {
            return input
                .iter()
                .filter(|item| {
                    matches!(item, FhirPathValue::Node(node) if node.path.as_deref() == Some(key))
                })
                .cloned()
                .collect();
        }

        let mut out = Collection::new();
        for item in input {
            let FhirPathValue::Node(node) = item else {
                continue;
            };
            let Value::Object(map) = &node.data else {
                continue;
            };

            let mut child_path = node.child_path(key);
            if let Some(model) = self.model()
                && let Some(redirect) = model.paths_defined_elsewhere.get(&child_path)
            {
                child_path = redirect.clone();
            }

            let mut field = key.to_string();
            let mut value = map.get(key);
            if let Some(model) = self.model()
                && let Some(types) = model.choice_type_paths.get(&child_path)
            {
                value = None;
                for suffix in types {
                    let candidate = format!("{key}{suffix}");
                    if let Some(found) = map.get(&candidate) {
                        value = Some(found);
                        field = candidate;
                        child_path = suffix.clone();
                        break;
                    }
                }
            }

            match value {
                None | Some(Value::Null) => {}
                Some(Value::Array(items)) => {
                    for (i, element) in items.iter().enumerate() {
                        out.push(FhirPathValue::Node(node.child(
                            element.clone(),
                            Some(child_path.clone()),
                            &[PathStep::Key(field.clone()), PathStep::Index(i)],
                        )));
                    }
                }
                Some(element) => {
                    out.push(FhirPathValue::Node(node.child(
                        element.clone(),
                        Some(child_path),
                        &[PathStep::Key(field)],
                    )));
                }
            }
        }
        out
    }

    fn invoke_function(
        &mut self,
        name: &str,
        input: Collection,
        args: &[ExpressionNode],
    ) -> EvalResult<Collection> {
        let invocation =
            registry::lookup(name).ok_or_else(|| EvaluationError::UnknownFunction {
                name: name.to_string(),
            })?;
        let signature = invocation
            .signatures
            .iter()
            .find(|sig| sig.len() == args.len())
            .ok_or_else(|| EvaluationError::InvalidArity {
                name: name.to_string(),
                arity: args.len(),
            })?;

        let mut params = Vec::with_capacity(args.len());
        for (spec, arg) in signature.iter().zip(args) {
            params.push(self.realize(*spec, arg, &input)?);
        }

        // Nullable functions short-circuit on an empty input or argument.
        if invocation.nullable
            && (input.is_empty() || params.iter().any(Param::is_empty_value))
        {
            return Ok(Collection::new());
        }
        (invocation.handler)(self, input, &params)
    }

    /// Operators go through the same table but the input collection is not
    /// part of the nullability check, only the operands are.
    fn invoke_operator(
        &mut self,
        name: &str,
        input: Collection,
        left: &ExpressionNode,
        right: &ExpressionNode,
    ) -> EvalResult<Collection> {
        let invocation =
            registry::lookup(name).ok_or_else(|| EvaluationError::UnknownFunction {
                name: name.to_string(),
            })?;
        let signature = invocation
            .signatures
            .iter()
            .find(|sig| sig.len() == 2)
            .ok_or_else(|| EvaluationError::InvalidArity {
                name: name.to_string(),
                arity: 2,
            })?;

        let params = vec![
            self.realize(signature[0], left, &input)?,
            self.realize(signature[1], right, &input)?,
        ];
        if invocation.nullable && params.iter().any(Param::is_empty_value) {
            return Ok(Collection::new());
        }
        (invocation.handler)(self, input, &params)
    }

    /// Turns an AST argument into a parameter according to its spec: either
    /// deferred (`Expr`), a type name, or an eagerly evaluated collection
    /// with an optional singleton type check.
    fn realize<'a>(
        &mut self,
        spec: ParamSpec,
        arg: &'a ExpressionNode,
        input: &Collection,
    ) -> EvalResult<Param<'a>> {
        match spec {
            ParamSpec::Expr => Ok(Param::Expr(arg)),
            ParamSpec::TypeSpecifier => {
                let name = type_specifier_name(arg).ok_or_else(|| {
                    EvaluationError::invalid_operation("expected a type specifier argument")
                })?;
                Ok(Param::Type(TypeInfo::from_specifier(&name)))
            }
            ParamSpec::AnyAtRoot => {
                let root = self.root().clone();
                Ok(Param::Value(self.eval_scoped(arg, root)?))
            }
            ParamSpec::Any => Ok(Param::Value(self.eval_scoped(arg, input.clone())?)),
            ParamSpec::String
            | ParamSpec::Integer
            | ParamSpec::Number
            | ParamSpec::MaybeBoolean => {
                let value = self.eval_scoped(arg, input.clone())?;
                Ok(Param::Value(check_singleton_type(spec, value)?))
            }
        }
    }

    fn literal(&mut self, lit: &LiteralValue) -> EvalResult<Collection> {
        Ok(match lit {
            LiteralValue::Null => Collection::new(),
            LiteralValue::Boolean(b) => vec![FhirPathValue::Boolean(*b)],
            LiteralValue::Integer(i) => vec![FhirPathValue::Integer(*i)],
            LiteralValue::Decimal(d) => vec![FhirPathValue::Decimal(*d)],
            LiteralValue::String(s) => vec![FhirPathValue::String(s.clone())],
            LiteralValue::Date(text) => {
                let parsed = FpDateTime::parse(text)
                    .ok_or_else(|| EvaluationError::InvalidLiteral { text: text.clone() })?;
                vec![FhirPathValue::Date(parsed)]
            }
            LiteralValue::DateTime(text) => {
                let parsed = FpDateTime::parse(text)
                    .ok_or_else(|| EvaluationError::InvalidLiteral { text: text.clone() })?;
                vec![FhirPathValue::DateTime(parsed)]
            }
            LiteralValue::Time(text) => {
                let parsed = FpTime::parse(text)
                    .ok_or_else(|| EvaluationError::InvalidLiteral { text: text.clone() })?;
                vec![FhirPathValue::Time(parsed)]
            }
            LiteralValue::Quantity { value, unit } => {
                vec![FhirPathValue::Quantity(crate::model::Quantity::new(
                    *value,
                    unit.clone(),
                ))]
            }
        })
    }
}

/// The indexer filters rather than fails: an empty, non-integer or
/// out-of-range index yields the empty collection.
fn index_into(collection: Collection, index: &Collection) -> Collection {
    let Some(first) = index.first() else {
        return Collection::new();
    };
    let Some(i) = first.unwrapped().as_integer() else {
        return Collection::new();
    };
    if i < 0 || i as usize >= collection.len() {
        return Collection::new();
    }
    vec![collection[i as usize].clone()]
}

fn apply_polarity(op: UnaryOperator, value: Collection) -> EvalResult<Collection> {
    if value.is_empty() {
        return Ok(value);
    }
    if value.len() > 1 {
        return Err(EvaluationError::SingletonExpected {
            actual: value.len(),
        });
    }
    let item = value[0].unwrapped();
    let negate = matches!(op, UnaryOperator::Minus);
    match item {
        FhirPathValue::Integer(i) => Ok(vec![FhirPathValue::Integer(if negate { -i } else { i })]),
        FhirPathValue::Decimal(d) => Ok(vec![FhirPathValue::Decimal(if negate { -d } else { d })]),
        other => Err(EvaluationError::UnexpectedType {
            expected: "number".to_string(),
            actual: other.type_name().to_string(),
        }),
    }
}

/// Flattens an identifier chain back into a dotted type name, e.g. the AST
/// for `FHIR.Patient` becomes `"FHIR.Patient"`.
fn type_specifier_name(node: &ExpressionNode) -> Option<String> {
    match node {
        ExpressionNode::Identifier(name) => Some(name.clone()),
        ExpressionNode::Path { base, path } => {
            let prefix = type_specifier_name(base)?;
            Some(format!("{prefix}.{path}"))
        }
        _ => None,
    }
}

fn check_singleton_type(spec: ParamSpec, value: Collection) -> EvalResult<Collection> {
    if value.is_empty() {
        return Ok(value);
    }
    if value.len() > 1 {
        return Err(EvaluationError::SingletonExpected {
            actual: value.len(),
        });
    }
    let item = value[0].unwrapped();
    let ok = match spec {
        ParamSpec::String => matches!(item, FhirPathValue::String(_)),
        ParamSpec::Integer => matches!(item, FhirPathValue::Integer(_)),
        ParamSpec::Number => matches!(
            item,
            FhirPathValue::Integer(_) | FhirPathValue::Decimal(_)
        ),
        ParamSpec::MaybeBoolean => matches!(item, FhirPathValue::Boolean(_)),
        _ => true,
    };
    if !ok {
        return Err(EvaluationError::UnexpectedType {
            expected: spec.expected_name().to_string(),
            actual: item.type_name().to_string(),
        });
    }
    Ok(vec![item])
}

/// The public evaluation entry point. Holds optional model information
/// (choice types and path redirections) and turns expression text plus a
/// JSON resource into plain JSON results.
#[derive(Default, Clone)]
pub struct FhirPathEngine {
    model: Option<Arc<ModelInfo>>,
}

impl FhirPathEngine {
    pub fn new() -> Self {
        FhirPathEngine { model: None }
    }

    pub fn with_model(model: ModelInfo) -> Self {
        FhirPathEngine {
            model: Some(Arc::new(model)),
        }
    }

    /// Parses and evaluates `expression` against `resource`.
    pub fn evaluate(
        &self,
        expression: &str,
        resource: &Value,
    ) -> Result<Vec<Value>, FhirPathError> {
        self.evaluate_with_vars(expression, resource, &HashMap::new())
    }

    /// Same as [`evaluate`](Self::evaluate) with caller-supplied environment
    /// variables.
    pub fn evaluate_with_vars(
        &self,
        expression: &str,
        resource: &Value,
        vars: &HashMap<String, Value>,
    ) -> Result<Vec<Value>, FhirPathError> {
        let ast = parser::parse(expression)?;
        let mut context = EvaluationContext::new(resource, self.model.clone());
        context.set_variables(vars);
        let result = context.evaluate_root(&ast)?;
        Ok(result.iter().map(FhirPathValue::to_json).collect())
    }
}
