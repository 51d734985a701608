//! Existence and distinctness functions.

use super::equality::value_pair_equal;
use super::helpers::expr_param;
use crate::evaluator::{EvalResult, EvaluationContext};
use crate::model::{Collection, FhirPathValue, is_true};
use crate::registry::Param;

pub(crate) fn empty_fn(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    Ok(vec![FhirPathValue::Boolean(input.is_empty())])
}

/// `not()` only has an answer for a singleton boolean; anything else is
/// empty rather than an error.
pub(crate) fn not_fn(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    if input.len() != 1 {
        return Ok(Collection::new());
    }
    Ok(match input[0].unwrapped().as_boolean() {
        Some(b) => vec![FhirPathValue::Boolean(!b)],
        None => Collection::new(),
    })
}

pub(crate) fn exists_fn(
    ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let filtered = match params.first() {
        Some(param) => filter(ctx, input, expr_param(param)?)?,
        None => input,
    };
    Ok(vec![FhirPathValue::Boolean(!filtered.is_empty())])
}

pub(crate) fn all_fn(
    ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let expr = expr_param(&params[0])?;
    for (i, item) in input.iter().enumerate() {
        let verdict = ctx.eval_lambda(expr, vec![item.clone()], Some(i as i64), Vec::new())?;
        if !is_true(&verdict) {
            return Ok(vec![FhirPathValue::Boolean(false)]);
        }
    }
    Ok(vec![FhirPathValue::Boolean(true)])
}

pub(crate) fn all_true(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    let all = input
        .iter()
        .all(|v| v.unwrapped().as_boolean() == Some(true));
    Ok(vec![FhirPathValue::Boolean(all)])
}

pub(crate) fn any_true(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    let any = input
        .iter()
        .any(|v| v.unwrapped().as_boolean() == Some(true));
    Ok(vec![FhirPathValue::Boolean(any)])
}

pub(crate) fn all_false(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    let all = input
        .iter()
        .all(|v| v.unwrapped().as_boolean() == Some(false));
    Ok(vec![FhirPathValue::Boolean(all)])
}

pub(crate) fn any_false(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    let any = input
        .iter()
        .any(|v| v.unwrapped().as_boolean() == Some(false));
    Ok(vec![FhirPathValue::Boolean(any)])
}

pub(crate) fn subset_of(
    _ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let other = params[0].collection();
    let subset = input.iter().all(|item| contains_value(other, item));
    Ok(vec![FhirPathValue::Boolean(subset)])
}

pub(crate) fn superset_of(
    _ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let other = params[0].collection();
    let superset = other.iter().all(|item| contains_value(&input, item));
    Ok(vec![FhirPathValue::Boolean(superset)])
}

pub(crate) fn is_distinct(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    let deduped = dedupe(&input);
    Ok(vec![FhirPathValue::Boolean(deduped.len() == input.len())])
}

pub(crate) fn distinct(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    Ok(dedupe(&input))
}

pub(crate) fn count(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    Ok(vec![FhirPathValue::Integer(input.len() as i64)])
}

fn filter(
    ctx: &mut EvaluationContext,
    input: Collection,
    expr: &crate::ast::ExpressionNode,
) -> EvalResult<Collection> {
    let mut out = Collection::new();
    for (i, item) in input.into_iter().enumerate() {
        let verdict = ctx.eval_lambda(expr, vec![item.clone()], Some(i as i64), Vec::new())?;
        if is_true(&verdict) {
            out.push(item);
        }
    }
    Ok(out)
}

pub(crate) fn contains_value(collection: &[FhirPathValue], needle: &FhirPathValue) -> bool {
    collection
        .iter()
        .any(|item| value_pair_equal(item, needle) == Some(true))
}

/// First-wins deduplication by strict equality.
pub(crate) fn dedupe(input: &[FhirPathValue]) -> Collection {
    let mut out = Collection::new();
    for item in input {
        if !contains_value(&out, item) {
            out.push(item.clone());
        }
    }
    out
}
