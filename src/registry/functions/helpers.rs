//! Small argument-shape helpers shared by the handler modules.

use crate::ast::ExpressionNode;
use crate::evaluator::{EvalResult, EvaluationError};
use crate::model::FhirPathValue;
use crate::registry::Param;

/// Reduces the input to at most one unwrapped value.
pub(crate) fn singleton(input: &[FhirPathValue]) -> EvalResult<Option<FhirPathValue>> {
    match input.len() {
        0 => Ok(None),
        1 => Ok(Some(input[0].unwrapped())),
        n => Err(EvaluationError::SingletonExpected { actual: n }),
    }
}

/// Singleton input that must be a string, as the string functions require.
/// Unlike most functions, an empty input is a singleton violation here, not
/// a quiet empty result.
pub(crate) fn string_input(input: &[FhirPathValue]) -> EvalResult<String> {
    match singleton(input)? {
        None => Err(EvaluationError::SingletonExpected { actual: 0 }),
        Some(FhirPathValue::String(s)) => Ok(s),
        Some(other) => Err(EvaluationError::UnexpectedType {
            expected: "String".to_string(),
            actual: other.type_name().to_string(),
        }),
    }
}

pub(crate) fn expr_param<'a>(param: &'a Param) -> EvalResult<&'a ExpressionNode> {
    param.expr().ok_or_else(|| {
        EvaluationError::invalid_operation("expected an expression argument")
    })
}

/// First value of an eagerly evaluated parameter, node wrappers removed.
pub(crate) fn param_value(param: &Param) -> Option<FhirPathValue> {
    param.collection().first().map(FhirPathValue::unwrapped)
}

pub(crate) fn param_string(param: &Param) -> Option<String> {
    param_value(param).and_then(|v| v.as_string())
}

pub(crate) fn param_integer(param: &Param) -> Option<i64> {
    param_value(param).and_then(|v| v.as_integer())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn singleton_works_on_borrowed_slices() {
        let values = vec![FhirPathValue::Integer(1), FhirPathValue::Integer(2)];
        assert_eq!(
            singleton(&values[..1]).unwrap(),
            Some(FhirPathValue::Integer(1))
        );
        assert_eq!(singleton(&values[..0]).unwrap(), None);
        assert!(matches!(
            singleton(&values),
            Err(EvaluationError::SingletonExpected { actual: 2 })
        ));
    }

    #[test]
    fn string_input_rejects_empty_and_non_string() {
        assert!(string_input(&[]).is_err());
        assert!(string_input(&[FhirPathValue::Integer(1)]).is_err());
        assert_eq!(
            string_input(&[FhirPathValue::String("ok".into())]).unwrap(),
            "ok"
        );
    }
}
