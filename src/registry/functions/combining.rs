//! Collection combination: `combine`, `union` and the `|` operator.

use super::existence::dedupe;
use crate::evaluator::{EvalResult, EvaluationContext};
use crate::model::Collection;
use crate::registry::Param;

/// Concatenation, duplicates preserved.
pub(crate) fn combine(
    _ctx: &mut EvaluationContext,
    mut input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    input.extend(params[0].collection().iter().cloned());
    Ok(input)
}

/// Merge with duplicate elimination, first occurrence wins.
pub(crate) fn union_fn(
    _ctx: &mut EvaluationContext,
    mut input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    input.extend(params[0].collection().iter().cloned());
    Ok(dedupe(&input))
}

/// The `|` operator: both sides are fully evaluated operands.
pub(crate) fn union_op(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let mut merged: Collection = params[0].collection().to_vec();
    merged.extend(params[1].collection().iter().cloned());
    Ok(dedupe(&merged))
}
