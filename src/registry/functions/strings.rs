//! String functions. All of them require a singleton string input and
//! surface anything else as a type error.

use regex::Regex;

use super::helpers::{param_integer, param_string, string_input};
use crate::evaluator::{EvalResult, EvaluationContext, EvaluationError};
use crate::model::{Collection, FhirPathValue};
use crate::registry::Param;

pub(crate) fn index_of(
    _ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let s = string_input(&input)?;
    let Some(substr) = param_string(&params[0]) else {
        return Ok(Collection::new());
    };
    let index = match s.find(&substr) {
        Some(byte_pos) => s[..byte_pos].chars().count() as i64,
        None => -1,
    };
    Ok(vec![FhirPathValue::Integer(index)])
}

pub(crate) fn substring(
    _ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let s = string_input(&input)?;
    let Some(start) = param_integer(&params[0]) else {
        return Ok(Collection::new());
    };
    let char_len = s.chars().count() as i64;
    if start < 0 || start >= char_len {
        return Ok(Collection::new());
    }
    let taken = match params.get(1) {
        Some(p) => match param_integer(p) {
            Some(len) => len.max(0) as usize,
            None => return Ok(Collection::new()),
        },
        None => usize::MAX,
    };
    let out: String = s.chars().skip(start as usize).take(taken).collect();
    Ok(vec![FhirPathValue::String(out)])
}

pub(crate) fn starts_with(
    _ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    with_pair(input, params, |s, prefix| {
        vec![FhirPathValue::Boolean(s.starts_with(prefix))]
    })
}

pub(crate) fn ends_with(
    _ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    with_pair(input, params, |s, suffix| {
        vec![FhirPathValue::Boolean(s.ends_with(suffix))]
    })
}

pub(crate) fn contains_fn(
    _ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    with_pair(input, params, |s, needle| {
        vec![FhirPathValue::Boolean(s.contains(needle))]
    })
}

/// Literal substring replacement, all occurrences.
pub(crate) fn replace_fn(
    _ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let s = string_input(&input)?;
    let (Some(pattern), Some(replacement)) =
        (param_string(&params[0]), param_string(&params[1]))
    else {
        return Ok(Collection::new());
    };
    Ok(vec![FhirPathValue::String(
        s.replace(&pattern, &replacement),
    )])
}

pub(crate) fn matches_fn(
    _ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let s = string_input(&input)?;
    let Some(pattern) = param_string(&params[0]) else {
        return Ok(Collection::new());
    };
    let re = compile(&pattern)?;
    Ok(vec![FhirPathValue::Boolean(re.is_match(&s))])
}

/// Regular-expression replacement, all matches; `$1`-style group references
/// are honored in the replacement.
pub(crate) fn replace_matches(
    _ctx: &mut EvaluationContext,
    input: Collection,
    params: &[Param],
) -> EvalResult<Collection> {
    let s = string_input(&input)?;
    let (Some(pattern), Some(replacement)) =
        (param_string(&params[0]), param_string(&params[1]))
    else {
        return Ok(Collection::new());
    };
    let re = compile(&pattern)?;
    Ok(vec![FhirPathValue::String(
        re.replace_all(&s, replacement.as_str()).into_owned(),
    )])
}

pub(crate) fn length_fn(
    _ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    let s = string_input(&input)?;
    Ok(vec![FhirPathValue::Integer(s.chars().count() as i64)])
}

fn with_pair(
    input: Collection,
    params: &[Param],
    f: impl FnOnce(&str, &str) -> Collection,
) -> EvalResult<Collection> {
    let s = string_input(&input)?;
    let Some(arg) = param_string(&params[0]) else {
        return Ok(Collection::new());
    };
    Ok(f(&s, &arg))
}

fn compile(pattern: &str) -> EvalResult<Regex> {
    Regex::new(pattern).map_err(|e| {
        EvaluationError::invalid_operation(format!("invalid regular expression: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use crate::evaluator::FhirPathEngine;
    use serde_json::json;

    #[test]
    fn substring_is_character_based() {
        let engine = FhirPathEngine::new();
        let resource = json!({"resourceType": "Basic"});
        assert_eq!(
            engine
                .evaluate("'héllo'.substring(1, 3)", &resource)
                .unwrap(),
            vec![json!("éll")]
        );
        assert!(engine
            .evaluate("'abc'.substring(5)", &resource)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn string_functions_reject_non_string_input() {
        let engine = FhirPathEngine::new();
        let resource = json!({"resourceType": "Basic", "n": 5});
        assert!(engine.evaluate("n.length()", &resource).is_err());
    }

    #[test]
    fn replace_matches_supports_groups() {
        let engine = FhirPathEngine::new();
        let resource = json!({"resourceType": "Basic"});
        assert_eq!(
            engine
                .evaluate(r"'11/30/1972'.replaceMatches('(\\d+)/(\\d+)/(\\d+)', '$3-$1-$2')", &resource)
                .unwrap(),
            vec![json!("1972-11-30")]
        );
    }
}
