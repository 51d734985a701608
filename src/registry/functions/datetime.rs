//! Clock functions. Both are memoized on the context so every call within
//! one evaluation run sees the same instant.

use crate::evaluator::{EvalResult, EvaluationContext};
use crate::model::{Collection, FhirPathValue};
use crate::registry::Param;

pub(crate) fn now_fn(
    ctx: &mut EvaluationContext,
    _input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    Ok(ctx
        .now()
        .map(FhirPathValue::DateTime)
        .into_iter()
        .collect())
}

pub(crate) fn today_fn(
    ctx: &mut EvaluationContext,
    _input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    Ok(ctx.today().map(FhirPathValue::Date).into_iter().collect())
}
