//! Filtering, projection and subsetting.

use serde_json::Value;

use super::helpers::{expr_param, param_integer};
use crate::evaluator::{EvalResult, EvaluationContext, EvaluationError};
use crate::model::{Collection, is_true};
use crate::registry::Param;

pub(crate) fn where_fn(
    ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let expr = expr_param(&params[0])?;
    let mut out = Collection::new();
    for (i, item) in input.into_iter().enumerate() {
        let verdict = ctx.eval_lambda(expr, vec![item.clone()], Some(i as i64), Vec::new())?;
        if is_true(&verdict) {
            out.push(item);
        }
    }
    Ok(out)
}

pub(crate) fn select_fn(
    ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let expr = expr_param(&params[0])?;
    let mut out = Collection::new();
    for (i, item) in input.into_iter().enumerate() {
        let projected = ctx.eval_lambda(expr, vec![item], Some(i as i64), Vec::new())?;
        out.extend(projected);
    }
    Ok(out)
}

/// Transitive closure of the projection. Already-visited values (compared by
/// their JSON shape) are not queued again, so cyclic data cannot loop.
pub(crate) fn repeat_fn(
    ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let expr = expr_param(&params[0])?;
    let mut out = Collection::new();
    let mut seen: Vec<Value> = Vec::new();
    let mut queue = input;
    while !queue.is_empty() {
        let mut next = Collection::new();
        for (i, item) in queue.into_iter().enumerate() {
            let projected = ctx.eval_lambda(expr, vec![item], Some(i as i64), Vec::new())?;
            for candidate in projected {
                let key = candidate.to_json();
                if !seen.contains(&key) {
                    seen.push(key);
                    out.push(candidate.clone());
                    next.push(candidate);
                }
            }
        }
        queue = next;
    }
    Ok(out)
}

pub(crate) fn of_type(
    _ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let type_info = params[0].type_info().ok_or_else(|| {
        EvaluationError::invalid_operation("ofType expects a type specifier")
    })?;
    Ok(input
        .into_iter()
        .filter(|item| type_info.matches(item))
        .collect())
}

pub(crate) fn single(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    if input.len() > 1 {
        return Err(EvaluationError::SingletonExpected {
            actual: input.len(),
        });
    }
    Ok(input)
}

pub(crate) fn first(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    Ok(input.into_iter().take(1).collect())
}

pub(crate) fn last(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    Ok(input.into_iter().last().into_iter().collect())
}

pub(crate) fn tail(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    Ok(input.into_iter().skip(1).collect())
}

pub(crate) fn take(
    _ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let n = param_integer(&params[0]).unwrap_or(0);
    if n <= 0 {
        return Ok(Collection::new());
    }
    Ok(input.into_iter().take(n as usize).collect())
}

pub(crate) fn skip(
    _ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let n = param_integer(&params[0]).unwrap_or(0);
    if n <= 0 {
        return Ok(input);
    }
    Ok(input.into_iter().skip(n as usize).collect())
}

#[cfg(test)]
mod tests {
    use crate::evaluator::FhirPathEngine;
    use serde_json::json;

    #[test]
    fn where_rebinds_this_and_index() {
        let engine = FhirPathEngine::new();
        let resource = json!({"resourceType": "Basic", "code": [10, 20, 30]});
        let out = engine
            .evaluate("code.where($index > 0 and $this > 15)", &resource)
            .unwrap();
        assert_eq!(out, vec![json!(20), json!(30)]);
    }

    #[test]
    fn repeat_terminates_on_revisited_values() {
        let engine = FhirPathEngine::new();
        let resource = json!({
            "resourceType": "Basic",
            "part": [{"name": "a", "part": [{"name": "b"}]}]
        });
        let out = engine.evaluate("repeat(part).name", &resource).unwrap();
        assert_eq!(out, vec![json!("a"), json!("b")]);
    }
}
