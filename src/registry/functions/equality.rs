//! Equality, equivalence and ordering.
//!
//! All four ordering operators and both equality flavors produce a
//! three-valued verdict: a boolean, or the empty collection when no verdict
//! exists (partial-precision date/times, incommensurable quantities).

use std::cmp::Ordering;

use serde_json::Value;

use super::helpers::singleton;
use crate::evaluator::{EvalResult, EvaluationContext, EvaluationError};
use crate::model::{Collection, FhirPathValue, FpDateTime, FpTime};
use crate::registry::Param;

pub(crate) fn equal(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    Ok(verdict(values_equal(
        params[0].collection(),
        params[1].collection(),
    )))
}

pub(crate) fn not_equal(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    Ok(verdict(
        values_equal(params[0].collection(), params[1].collection()).map(|b| !b),
    ))
}

pub(crate) fn equivalent(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let (a, b) = (params[0].collection(), params[1].collection());
    if a.is_empty() && b.is_empty() {
        return Ok(vec![FhirPathValue::Boolean(true)]);
    }
    if a.is_empty() || b.is_empty() {
        return Ok(Collection::new());
    }
    Ok(vec![FhirPathValue::Boolean(values_equivalent(a, b))])
}

pub(crate) fn not_equivalent(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let (a, b) = (params[0].collection(), params[1].collection());
    if a.is_empty() && b.is_empty() {
        return Ok(vec![FhirPathValue::Boolean(false)]);
    }
    if a.is_empty() || b.is_empty() {
        return Ok(Collection::new());
    }
    Ok(vec![FhirPathValue::Boolean(!values_equivalent(a, b))])
}

pub(crate) fn less_than(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    ordered(params, |o| o == Ordering::Less)
}

pub(crate) fn greater_than(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    ordered(params, |o| o == Ordering::Greater)
}

pub(crate) fn less_or_equal(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    ordered(params, |o| o != Ordering::Greater)
}

pub(crate) fn greater_or_equal(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    ordered(params, |o| o != Ordering::Less)
}

fn verdict(v: Option<bool>) -> Collection {
    v.map(FhirPathValue::Boolean).into_iter().collect()
}

fn ordered(params: &[Param], pred: fn(Ordering) -> bool) -> EvalResult<Collection> {
    let Some(a) = singleton(params[0].collection())? else {
        return Ok(Collection::new());
    };
    let Some(b) = singleton(params[1].collection())? else {
        return Ok(Collection::new());
    };
    Ok(verdict(compare_values(&a, &b)?.map(pred)))
}

/// Collection equality: item count and order must match, every pair must
/// compare equal. A pair with no verdict makes the whole comparison empty
/// unless another pair already decided `false`.
pub(crate) fn values_equal(a: &[FhirPathValue], b: &[FhirPathValue]) -> Option<bool> {
    if a.len() != b.len() {
        return Some(false);
    }
    let mut unknown = false;
    for (x, y) in a.iter().zip(b) {
        match value_pair_equal(x, y) {
            Some(false) => return Some(false),
            Some(true) => {}
            None => unknown = true,
        }
    }
    if unknown { None } else { Some(true) }
}

/// Equality of two single values, with the string-to-temporal coercion the
/// comparison family applies.
pub(crate) fn value_pair_equal(x: &FhirPathValue, y: &FhirPathValue) -> Option<bool> {
    use FhirPathValue as V;
    let (x, y) = (x.unwrapped(), y.unwrapped());
    match (&x, &y) {
        (V::Boolean(a), V::Boolean(b)) => Some(a == b),
        (V::Integer(_) | V::Decimal(_), V::Integer(_) | V::Decimal(_)) => {
            Some(x.as_decimal() == y.as_decimal())
        }
        (V::String(a), V::String(b)) => Some(a == b),
        (V::String(s), V::Date(d) | V::DateTime(d)) | (V::Date(d) | V::DateTime(d), V::String(s)) => {
            match FpDateTime::parse(s) {
                Some(parsed) => parsed.compare(d).map(|o| o == Ordering::Equal),
                None => Some(false),
            }
        }
        (V::String(s), V::Time(t)) | (V::Time(t), V::String(s)) => match FpTime::parse(s) {
            Some(parsed) => parsed.compare(t).map(|o| o == Ordering::Equal),
            None => Some(false),
        },
        (V::Date(a) | V::DateTime(a), V::Date(b) | V::DateTime(b)) => {
            a.compare(b).map(|o| o == Ordering::Equal)
        }
        (V::Time(a), V::Time(b)) => a.compare(b).map(|o| o == Ordering::Equal),
        (V::Quantity(a), V::Quantity(b)) => a.compare(b).map(|o| o == Ordering::Equal),
        (V::TypeInfo(a), V::TypeInfo(b)) => Some(a == b),
        (V::Node(a), V::Node(b)) => Some(a.data == b.data),
        _ => Some(false),
    }
}

/// Ordering of two single values; mismatched types are an error, not a
/// quiet empty result.
pub(crate) fn compare_values(
    x: &FhirPathValue,
    y: &FhirPathValue,
) -> EvalResult<Option<Ordering>> {
    use FhirPathValue as V;
    let (x, y) = (x.unwrapped(), y.unwrapped());
    match (&x, &y) {
        (V::String(a), V::String(b)) => Ok(Some(a.cmp(b))),
        (V::Integer(_) | V::Decimal(_), V::Integer(_) | V::Decimal(_)) => {
            match (x.as_decimal(), y.as_decimal()) {
                (Some(a), Some(b)) => Ok(Some(a.cmp(&b))),
                _ => Err(mismatch(&x, &y)),
            }
        }
        (V::Date(a) | V::DateTime(a), V::Date(b) | V::DateTime(b)) => Ok(a.compare(b)),
        (V::String(s), V::Date(d) | V::DateTime(d)) => match FpDateTime::parse(s) {
            Some(parsed) => Ok(parsed.compare(d)),
            None => Err(mismatch(&x, &y)),
        },
        (V::Date(d) | V::DateTime(d), V::String(s)) => match FpDateTime::parse(s) {
            Some(parsed) => Ok(d.compare(&parsed)),
            None => Err(mismatch(&x, &y)),
        },
        (V::Time(a), V::Time(b)) => Ok(a.compare(b)),
        (V::String(s), V::Time(t)) => match FpTime::parse(s) {
            Some(parsed) => Ok(parsed.compare(t)),
            None => Err(mismatch(&x, &y)),
        },
        (V::Time(t), V::String(s)) => match FpTime::parse(s) {
            Some(parsed) => Ok(t.compare(&parsed)),
            None => Err(mismatch(&x, &y)),
        },
        (V::Quantity(a), V::Quantity(b)) => Ok(a.compare(b)),
        _ => Err(mismatch(&x, &y)),
    }
}

fn mismatch(x: &FhirPathValue, y: &FhirPathValue) -> EvaluationError {
    EvaluationError::TypeMismatch {
        left: x.type_name().to_string(),
        right: y.type_name().to_string(),
    }
}

/// Pairwise equivalence. Strings fold case and collapse whitespace, numbers
/// compare at the coarser scale, temporals require matching precision.
pub(crate) fn values_equivalent(a: &[FhirPathValue], b: &[FhirPathValue]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| value_pair_equivalent(x, y))
}

pub(crate) fn value_pair_equivalent(x: &FhirPathValue, y: &FhirPathValue) -> bool {
    use FhirPathValue as V;
    let (x, y) = (x.unwrapped(), y.unwrapped());
    match (&x, &y) {
        (V::Boolean(a), V::Boolean(b)) => a == b,
        (V::Integer(_) | V::Decimal(_), V::Integer(_) | V::Decimal(_)) => {
            match (x.as_decimal(), y.as_decimal()) {
                (Some(a), Some(b)) => {
                    let dp = a.scale().min(b.scale());
                    a.round_dp(dp) == b.round_dp(dp)
                }
                _ => false,
            }
        }
        (V::String(a), V::String(b)) => normalize_string(a) == normalize_string(b),
        (V::Date(a) | V::DateTime(a), V::Date(b) | V::DateTime(b)) => a.equivalent(b),
        (V::Time(a), V::Time(b)) => a.equivalent(b),
        (V::Quantity(a), V::Quantity(b)) => a.equivalent(b),
        (V::TypeInfo(a), V::TypeInfo(b)) => a == b,
        (V::Node(a), V::Node(b)) => json_equivalent(&a.data, &b.data),
        _ => false,
    }
}

fn normalize_string(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn json_equivalent(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| json_equivalent(v, w)))
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(v, w)| json_equivalent(v, w))
        }
        _ => value_pair_equivalent(&FhirPathValue::from_json(a), &FhirPathValue::from_json(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dt(s: &str) -> FhirPathValue {
        FhirPathValue::DateTime(FpDateTime::parse(s).unwrap())
    }

    #[test]
    fn mixed_precision_datetime_equality_has_no_verdict() {
        assert_eq!(value_pair_equal(&dt("2015"), &dt("2015-06")), None);
        assert_eq!(value_pair_equal(&dt("2015"), &dt("2016-01")), Some(false));
        assert_eq!(value_pair_equal(&dt("2015-06"), &dt("2015-06")), Some(true));
    }

    #[test]
    fn integers_and_decimals_compare_numerically() {
        assert_eq!(
            value_pair_equal(
                &FhirPathValue::Integer(2),
                &FhirPathValue::Decimal(Decimal::new(20, 1))
            ),
            Some(true)
        );
    }

    #[test]
    fn equivalence_normalizes_strings_and_scale() {
        assert!(value_pair_equivalent(
            &FhirPathValue::String("Hello\t World".into()),
            &FhirPathValue::String("hello world".into())
        ));
        assert!(value_pair_equivalent(
            &FhirPathValue::Decimal(Decimal::new(67, 2)),
            &FhirPathValue::Decimal(Decimal::new(7, 1))
        ));
    }

    #[test]
    fn ordering_rejects_mismatched_types() {
        let err = compare_values(
            &FhirPathValue::Integer(1),
            &FhirPathValue::String("x".into()),
        );
        assert!(err.is_err());
    }
}
