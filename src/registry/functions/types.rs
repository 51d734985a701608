//! Type inspection: the `is`/`as` operators, their function forms and
//! `type()`.

use crate::evaluator::{EvalResult, EvaluationContext, EvaluationError};
use crate::model::{Collection, FhirPathValue, TypeInfo};
use crate::registry::Param;

/// Shared by the `is` operator and `is()` function: a singleton type test.
pub(crate) fn check_is(input: &Collection, type_info: &TypeInfo) -> EvalResult<Collection> {
    if input.is_empty() {
        return Ok(Collection::new());
    }
    if input.len() > 1 {
        return Err(EvaluationError::SingletonExpected {
            actual: input.len(),
        });
    }
    Ok(vec![FhirPathValue::Boolean(type_info.matches(&input[0]))])
}

/// Shared by the `as` operator: the value passes through when it has the
/// requested type, otherwise the result is empty.
pub(crate) fn cast_as(input: Collection, type_info: &TypeInfo) -> EvalResult<Collection> {
    if input.len() > 1 {
        return Err(EvaluationError::SingletonExpected {
            actual: input.len(),
        });
    }
    Ok(input
        .into_iter()
        .filter(|item| type_info.matches(item))
        .collect())
}

pub(crate) fn is_fn(
    _ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let type_info = params[0]
        .type_info()
        .ok_or_else(|| EvaluationError::invalid_operation("is expects a type specifier"))?;
    check_is(&input, type_info)
}

pub(crate) fn type_fn(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    Ok(input
        .iter()
        .map(|item| FhirPathValue::TypeInfo(TypeInfo::of(item)))
        .collect())
}

#[cfg(test)]
mod tests {
    use crate::evaluator::FhirPathEngine;
    use serde_json::json;

    #[test]
    fn is_checks_system_and_resource_types() {
        let engine = FhirPathEngine::new();
        let resource = json!({"resourceType": "Patient", "active": true});
        assert_eq!(
            engine.evaluate("active is Boolean", &resource).unwrap(),
            vec![json!(true)]
        );
        assert_eq!(
            engine.evaluate("$this is Patient", &resource).unwrap(),
            vec![json!(true)]
        );
        assert_eq!(
            engine.evaluate("active.is(System.String)", &resource).unwrap(),
            vec![json!(false)]
        );
    }

    #[test]
    fn of_type_filters_mixed_collections() {
        let engine = FhirPathEngine::new();
        let resource = json!({"resourceType": "Basic", "v": [1, "a", 2]});
        assert_eq!(
            engine.evaluate("v.ofType(Integer)", &resource).unwrap(),
            vec![json!(1), json!(2)]
        );
    }
}
