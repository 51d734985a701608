//! Membership operators `in` and `contains`.

use super::existence::contains_value;
use super::helpers::singleton;
use crate::evaluator::{EvalResult, EvaluationContext};
use crate::model::{Collection, FhirPathValue};
use crate::registry::Param;

/// `left in right`: singleton membership test. An empty left side is empty,
/// an empty right side is false.
pub(crate) fn in_op(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    membership(params[0].collection(), params[1].collection())
}

/// `left contains right`: `in` with the operands swapped.
pub(crate) fn contains_op(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    membership(params[1].collection(), params[0].collection())
}

fn membership(needle: &[FhirPathValue], haystack: &[FhirPathValue]) -> EvalResult<Collection> {
    let Some(needle) = singleton(needle)? else {
        return Ok(Collection::new());
    };
    Ok(vec![FhirPathValue::Boolean(contains_value(
        haystack, &needle,
    ))])
}

#[cfg(test)]
mod tests {
    use crate::evaluator::FhirPathEngine;
    use serde_json::json;

    #[test]
    fn membership_handles_empty_sides() {
        let engine = FhirPathEngine::new();
        let resource = json!({"resourceType": "Basic", "tag": ["a", "b"]});
        assert_eq!(
            engine.evaluate("'a' in tag", &resource).unwrap(),
            vec![json!(true)]
        );
        assert_eq!(
            engine.evaluate("tag contains 'c'", &resource).unwrap(),
            vec![json!(false)]
        );
        assert!(engine.evaluate("{} in tag", &resource).unwrap().is_empty());
        assert_eq!(
            engine.evaluate("'a' in {}", &resource).unwrap(),
            vec![json!(false)]
        );
    }
}
