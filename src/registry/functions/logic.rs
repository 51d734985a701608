//! Three-valued boolean operators. Each operand arrives as an empty
//! collection or a singleton boolean; empty means unknown.

use crate::evaluator::{EvalResult, EvaluationContext};
use crate::model::{Collection, FhirPathValue};
use crate::registry::Param;

fn operand(param: &Param) -> Option<bool> {
    param
        .collection()
        .first()
        .and_then(|v| v.unwrapped().as_boolean())
}

fn verdict(v: Option<bool>) -> Collection {
    v.map(FhirPathValue::Boolean).into_iter().collect()
}

pub(crate) fn and_op(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let (a, b) = (operand(&params[0]), operand(&params[1]));
    Ok(verdict(match (a, b) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }))
}

pub(crate) fn or_op(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let (a, b) = (operand(&params[0]), operand(&params[1]));
    Ok(verdict(match (a, b) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }))
}

pub(crate) fn xor_op(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let (a, b) = (operand(&params[0]), operand(&params[1]));
    Ok(verdict(match (a, b) {
        (Some(x), Some(y)) => Some(x != y),
        _ => None,
    }))
}

/// A false antecedent makes the implication true regardless of the
/// consequent; an unknown antecedent only resolves when the consequent is
/// true.
pub(crate) fn implies_op(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let (a, b) = (operand(&params[0]), operand(&params[1]));
    Ok(verdict(match (a, b) {
        (Some(false), _) => Some(true),
        (Some(true), other) => other,
        (None, Some(true)) => Some(true),
        (None, _) => None,
    }))
}

#[cfg(test)]
mod tests {
    use crate::evaluator::FhirPathEngine;
    use serde_json::json;

    fn eval(expr: &str) -> Vec<serde_json::Value> {
        FhirPathEngine::new()
            .evaluate(expr, &json!({"resourceType": "Basic"}))
            .unwrap()
    }

    #[test]
    fn unknown_operands_follow_kleene_logic() {
        assert_eq!(eval("{} and false"), vec![json!(false)]);
        assert!(eval("{} and true").is_empty());
        assert_eq!(eval("{} or true"), vec![json!(true)]);
        assert!(eval("{} xor true").is_empty());
    }

    #[test]
    fn implies_truth_table_edges() {
        assert_eq!(eval("false implies {}"), vec![json!(true)]);
        assert_eq!(eval("{} implies true"), vec![json!(true)]);
        assert!(eval("{} implies false").is_empty());
        assert!(eval("true implies {}").is_empty());
    }
}
