//! Arithmetic operators and the math function family.
//!
//! Integer pairs stay integers where the operation allows it; anything mixed
//! is carried out in decimal. Undefined results (division by zero, roots of
//! negatives, logs of non-positives) are the empty collection, not errors.

use rust_decimal::{Decimal, MathematicalOps, prelude::ToPrimitive};

use super::helpers::{param_value, singleton};
use crate::evaluator::{EvalResult, EvaluationContext, EvaluationError};
use crate::model::{Collection, FhirPathValue};
use crate::registry::Param;

pub(crate) fn plus(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let (a, b) = operands(params)?;
    use FhirPathValue as V;
    match (&a, &b) {
        (V::String(x), V::String(y)) => Ok(vec![V::String(format!("{x}{y}"))]),
        (V::Integer(x), V::Integer(y)) => checked_int(x.checked_add(*y)),
        _ => numeric(&a, &b, |x, y| x.checked_add(y)),
    }
}

pub(crate) fn minus(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let (a, b) = operands(params)?;
    use FhirPathValue as V;
    match (&a, &b) {
        (V::Integer(x), V::Integer(y)) => checked_int(x.checked_sub(*y)),
        _ => numeric(&a, &b, |x, y| x.checked_sub(y)),
    }
}

pub(crate) fn multiply(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let (a, b) = operands(params)?;
    use FhirPathValue as V;
    match (&a, &b) {
        (V::Integer(x), V::Integer(y)) => checked_int(x.checked_mul(*y)),
        _ => numeric(&a, &b, |x, y| x.checked_mul(y)),
    }
}

/// `/` always produces a decimal; division by zero is empty.
pub(crate) fn divide(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let (a, b) = decimals(params)?;
    if b.is_zero() {
        return Ok(Collection::new());
    }
    Ok(a.checked_div(b)
        .map(FhirPathValue::Decimal)
        .into_iter()
        .collect())
}

/// `div` truncates toward zero and yields an integer.
pub(crate) fn int_divide(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let (a, b) = decimals(params)?;
    if b.is_zero() {
        return Ok(Collection::new());
    }
    Ok(a.checked_div(b)
        .map(|q| q.trunc())
        .and_then(|q| q.to_i64())
        .map(FhirPathValue::Integer)
        .into_iter()
        .collect())
}

pub(crate) fn modulo(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let (a, b) = operands(params)?;
    use FhirPathValue as V;
    if let (V::Integer(x), V::Integer(y)) = (&a, &b) {
        if *y == 0 {
            return Ok(Collection::new());
        }
        return Ok(vec![V::Integer(x % y)]);
    }
    let (x, y) = decimals(params)?;
    if y.is_zero() {
        return Ok(Collection::new());
    }
    Ok(x.checked_rem(y)
        .map(FhirPathValue::Decimal)
        .into_iter()
        .collect())
}

/// `&` concatenates, treating an empty operand as the empty string.
pub(crate) fn amp(
    _ctx: &mut EvaluationContext,
    _input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let a = param_value(&params[0])
        .and_then(|v| v.as_string())
        .unwrap_or_default();
    let b = param_value(&params[1])
        .and_then(|v| v.as_string())
        .unwrap_or_default();
    Ok(vec![FhirPathValue::String(format!("{a}{b}"))])
}

pub(crate) fn abs_fn(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    match number_input(&input)? {
        None => Ok(Collection::new()),
        Some(FhirPathValue::Integer(i)) => Ok(vec![FhirPathValue::Integer(i.abs())]),
        Some(FhirPathValue::Decimal(d)) => Ok(vec![FhirPathValue::Decimal(d.abs())]),
        Some(_) => Ok(Collection::new()),
    }
}

pub(crate) fn ceiling(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    as_integer_result(&input, |d| d.ceil())
}

pub(crate) fn floor_fn(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    as_integer_result(&input, |d| d.floor())
}

pub(crate) fn truncate_fn(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    as_integer_result(&input, |d| d.trunc())
}

pub(crate) fn exp_fn(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    let Some(d) = decimal_input(&input)? else {
        return Ok(Collection::new());
    };
    Ok(d.checked_exp()
        .map(FhirPathValue::Decimal)
        .into_iter()
        .collect())
}

pub(crate) fn ln_fn(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    let Some(d) = decimal_input(&input)? else {
        return Ok(Collection::new());
    };
    if d <= Decimal::ZERO {
        return Ok(Collection::new());
    }
    Ok(vec![FhirPathValue::Decimal(d.ln())])
}

pub(crate) fn log_fn(
    _ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let Some(d) = decimal_input(&input)? else {
        return Ok(Collection::new());
    };
    let Some(base) = param_value(&params[0]).and_then(|v| v.as_decimal()) else {
        return Ok(Collection::new());
    };
    if d <= Decimal::ZERO || base <= Decimal::ZERO || base == Decimal::ONE {
        return Ok(Collection::new());
    }
    Ok(d.ln()
        .checked_div(base.ln())
        .map(FhirPathValue::Decimal)
        .into_iter()
        .collect())
}

pub(crate) fn power(
    _ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let Some(d) = decimal_input(&input)? else {
        return Ok(Collection::new());
    };
    let Some(exponent) = param_value(&params[0]).and_then(|v| v.as_decimal()) else {
        return Ok(Collection::new());
    };
    // A negative base with a fractional exponent has no real-valued result.
    if d < Decimal::ZERO && !exponent.is_integer() {
        return Ok(Collection::new());
    }
    Ok(d.checked_powd(exponent)
        .map(FhirPathValue::Decimal)
        .into_iter()
        .collect())
}

pub(crate) fn round_fn(
    _ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let Some(d) = decimal_input(&input)? else {
        return Ok(Collection::new());
    };
    match params.first() {
        None => Ok(d
            .round()
            .to_i64()
            .map(FhirPathValue::Integer)
            .into_iter()
            .collect()),
        Some(p) => {
            let Some(precision) = param_value(p).and_then(|v| v.as_integer()) else {
                return Ok(Collection::new());
            };
            if precision < 0 {
                return Ok(Collection::new());
            }
            Ok(vec![FhirPathValue::Decimal(d.round_dp(precision as u32))])
        }
    }
}

pub(crate) fn sqrt_fn(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    let Some(d) = decimal_input(&input)? else {
        return Ok(Collection::new());
    };
    if d < Decimal::ZERO {
        return Ok(Collection::new());
    }
    Ok(d.sqrt().map(FhirPathValue::Decimal).into_iter().collect())
}

/// Both operands of a binary arithmetic operator, singleton-checked.
/// Nullable dispatch guarantees neither is empty.
fn operands(params: &[Param]) -> EvalResult<(FhirPathValue, FhirPathValue)> {
    let a = singleton(params[0].collection())?;
    let b = singleton(params[1].collection())?;
    match (a, b) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(EvaluationError::invalid_operation(
            "arithmetic operand is empty",
        )),
    }
}

fn decimals(params: &[Param]) -> EvalResult<(Decimal, Decimal)> {
    let (a, b) = operands(params)?;
    match (a.as_decimal(), b.as_decimal()) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(EvaluationError::TypeMismatch {
            left: a.type_name().to_string(),
            right: b.type_name().to_string(),
        }),
    }
}

fn numeric(
    a: &FhirPathValue,
    b: &FhirPathValue,
    op: fn(Decimal, Decimal) -> Option<Decimal>,
) -> EvalResult<Collection> {
    match (a.as_decimal(), b.as_decimal()) {
        (Some(x), Some(y)) => Ok(op(x, y)
            .map(FhirPathValue::Decimal)
            .into_iter()
            .collect()),
        _ => Err(EvaluationError::TypeMismatch {
            left: a.type_name().to_string(),
            right: b.type_name().to_string(),
        }),
    }
}

fn checked_int(result: Option<i64>) -> EvalResult<Collection> {
    result
        .map(|i| vec![FhirPathValue::Integer(i)])
        .ok_or_else(|| EvaluationError::invalid_operation("integer overflow"))
}

fn number_input(input: &Collection) -> EvalResult<Option<FhirPathValue>> {
    match singleton(input)? {
        None => Ok(None),
        Some(v @ (FhirPathValue::Integer(_) | FhirPathValue::Decimal(_))) => Ok(Some(v)),
        Some(other) => Err(EvaluationError::UnexpectedType {
            expected: "Integer or Decimal".to_string(),
            actual: other.type_name().to_string(),
        }),
    }
}

fn decimal_input(input: &Collection) -> EvalResult<Option<Decimal>> {
    Ok(number_input(input)?.and_then(|v| v.as_decimal()))
}

fn as_integer_result(
    input: &Collection,
    f: fn(&Decimal) -> Decimal,
) -> EvalResult<Collection> {
    let Some(d) = decimal_input(input)? else {
        return Ok(Collection::new());
    };
    Ok(f(&d)
        .to_i64()
        .map(FhirPathValue::Integer)
        .into_iter()
        .collect())
}
