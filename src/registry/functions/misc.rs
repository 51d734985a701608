//! Control flow, tracing and type conversion.

use rust_decimal::Decimal;
use serde_json::Value;

use super::helpers::{expr_param, param_string, singleton};
use crate::evaluator::{EvalResult, EvaluationContext};
use crate::model::{Collection, FhirPathValue, FpDateTime, FpTime, is_true};
use crate::registry::Param;

/// `iif(condition, then, otherwise?)`. Only the selected branch is
/// evaluated. Sub-expressions run in the enclosing frame so `$index` and
/// `$total` stay visible inside an `aggregate` or `where` body.
pub(crate) fn iif_fn(
    ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let condition = expr_param(&params[0])?;
    let verdict = ctx.eval_scoped(condition, input.clone())?;
    if is_true(&verdict) {
        ctx.eval_scoped(expr_param(&params[1])?, input)
    } else if let Some(otherwise) = params.get(2) {
        ctx.eval_scoped(expr_param(otherwise)?, input)
    } else {
        Ok(Collection::new())
    }
}

/// Logs the current collection and passes it through unchanged.
pub(crate) fn trace_fn(
    _ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let label = params
        .first()
        .and_then(param_string)
        .unwrap_or_else(|| "trace".to_string());
    let snapshot = Value::Array(input.iter().map(FhirPathValue::to_json).collect());
    log::info!(target: "fhirpatch::trace", "{label}: {snapshot}");
    Ok(input)
}

pub(crate) fn to_integer(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    let Some(value) = singleton(&input)? else {
        return Ok(Collection::new());
    };
    let converted = match value {
        FhirPathValue::Integer(i) => Some(i),
        FhirPathValue::Boolean(b) => Some(i64::from(b)),
        FhirPathValue::Decimal(d) if d.is_integer() => d.try_into().ok(),
        FhirPathValue::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    Ok(converted.map(FhirPathValue::Integer).into_iter().collect())
}

pub(crate) fn to_decimal(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    let Some(value) = singleton(&input)? else {
        return Ok(Collection::new());
    };
    let converted = match value {
        FhirPathValue::Integer(i) => Some(Decimal::from(i)),
        FhirPathValue::Decimal(d) => Some(d),
        FhirPathValue::Boolean(b) => Some(Decimal::from(i64::from(b))),
        FhirPathValue::String(s) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    };
    Ok(converted.map(FhirPathValue::Decimal).into_iter().collect())
}

pub(crate) fn to_string(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    let Some(value) = singleton(&input)? else {
        return Ok(Collection::new());
    };
    let text = match value {
        FhirPathValue::String(s) => s,
        FhirPathValue::Boolean(b) => b.to_string(),
        FhirPathValue::Integer(i) => i.to_string(),
        FhirPathValue::Decimal(d) => d.to_string(),
        FhirPathValue::Date(d) | FhirPathValue::DateTime(d) => d.as_str().to_string(),
        FhirPathValue::Time(t) => t.as_str().to_string(),
        FhirPathValue::Quantity(q) => q.to_string(),
        FhirPathValue::TypeInfo(t) => t.to_string(),
        FhirPathValue::Node(node) => node.data.to_string(),
    };
    Ok(vec![FhirPathValue::String(text)])
}

pub(crate) fn to_boolean(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    let Some(value) = singleton(&input)? else {
        return Ok(Collection::new());
    };
    let converted = match value {
        FhirPathValue::Boolean(b) => Some(b),
        FhirPathValue::Integer(1) => Some(true),
        FhirPathValue::Integer(0) => Some(false),
        FhirPathValue::Decimal(d) if d == Decimal::ONE => Some(true),
        FhirPathValue::Decimal(d) if d == Decimal::ZERO => Some(false),
        FhirPathValue::String(s) => match s.to_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" | "1.0" => Some(true),
            "false" | "f" | "no" | "n" | "0" | "0.0" => Some(false),
            _ => None,
        },
        _ => None,
    };
    Ok(converted.map(FhirPathValue::Boolean).into_iter().collect())
}

pub(crate) fn to_date_time(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    let Some(value) = singleton(&input)? else {
        return Ok(Collection::new());
    };
    let converted = match value {
        FhirPathValue::Date(d) | FhirPathValue::DateTime(d) => Some(d),
        FhirPathValue::String(s) => FpDateTime::parse(&s),
        _ => None,
    };
    Ok(converted
        .map(FhirPathValue::DateTime)
        .into_iter()
        .collect())
}

pub(crate) fn to_time(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    let Some(value) = singleton(&input)? else {
        return Ok(Collection::new());
    };
    let converted = match value {
        FhirPathValue::Time(t) => Some(t),
        FhirPathValue::String(s) => FpTime::parse(&s),
        _ => None,
    };
    Ok(converted.map(FhirPathValue::Time).into_iter().collect())
}

#[cfg(test)]
mod tests {
    use crate::evaluator::FhirPathEngine;
    use serde_json::json;

    #[test]
    fn iif_evaluates_only_the_taken_branch() {
        let engine = FhirPathEngine::new();
        let resource = json!({"resourceType": "Basic"});
        // The untaken branch would error if it were evaluated.
        let out = engine
            .evaluate("iif(true, 'yes', 1 < 'oops')", &resource)
            .unwrap();
        assert_eq!(out, vec![json!("yes")]);
    }

    #[test]
    fn conversions_return_empty_on_failure() {
        let engine = FhirPathEngine::new();
        let resource = json!({"resourceType": "Basic", "v": "abc"});
        assert!(engine.evaluate("v.toInteger()", &resource).unwrap().is_empty());
        assert_eq!(
            engine.evaluate("'42'.toInteger()", &resource).unwrap(),
            vec![json!(42)]
        );
    }
}
