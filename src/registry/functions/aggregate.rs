//! The `aggregate` fold.

use super::helpers::expr_param;
use crate::evaluator::{EvalResult, EvaluationContext};
use crate::model::Collection;
use crate::registry::Param;

/// Folds the input through the aggregator expression. `$this` is the current
/// item, `$index` its position and `$total` the running accumulator, seeded
/// from the optional second argument.
pub(crate) fn aggregate_fn(
    ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let expr = expr_param(&params[0])?;
    let mut total: Collection = params
        .get(1)
        .map(|p| p.collection().to_vec())
        .unwrap_or_default();
    for (i, item) in input.into_iter().enumerate() {
        total = ctx.eval_lambda(expr, vec![item], Some(i as i64), total)?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use crate::evaluator::FhirPathEngine;
    use serde_json::json;

    #[test]
    fn aggregate_sums_with_seed() {
        let engine = FhirPathEngine::new();
        let resource = json!({"resourceType": "Basic", "n": [1, 2, 3]});
        let out = engine
            .evaluate("n.aggregate($this + $total, 10)", &resource)
            .unwrap();
        assert_eq!(out, vec![json!(16)]);
    }
}
