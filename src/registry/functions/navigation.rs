//! Tree navigation: `children` and `descendants`.

use serde_json::Value;

use crate::evaluator::{EvalResult, EvaluationContext};
use crate::model::{Collection, FhirPathValue, PathStep};
use crate::registry::Param;

pub(crate) fn children(
    ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    Ok(immediate_children(ctx, &input))
}

pub(crate) fn descendants(
    ctx: &mut EvaluationContext,
    input: Collection,
    _params: &[Param],
) -> EvalResult<Collection> {
    let mut out = Collection::new();
    let mut frontier = immediate_children(ctx, &input);
    while !frontier.is_empty() {
        let next = immediate_children(ctx, &frontier);
        out.extend(frontier);
        frontier = next;
    }
    Ok(out)
}

/// Every element value of every object node, arrays flattened, with type
/// paths and locations extended the same way ordinary member access does.
fn immediate_children(ctx: &EvaluationContext, input: &Collection) -> Collection {
    let mut out = Collection::new();
    for item in input {
        let FhirPathValue::Node(node) = item else {
            continue;
        };
        let Value::Object(map) = &node.data else {
            continue;
        };
        for (key, value) in map {
            let mut child_path = node.child_path(key);
            if let Some(model) = ctx.model()
                && let Some(redirect) = model.paths_defined_elsewhere.get(&child_path)
            {
                child_path = redirect.clone();
            }
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    for (i, element) in items.iter().enumerate() {
                        out.push(FhirPathValue::Node(node.child(
                            element.clone(),
                            Some(child_path.clone()),
                            &[PathStep::Key(key.clone()), PathStep::Index(i)],
                        )));
                    }
                }
                element => {
                    out.push(FhirPathValue::Node(node.child(
                        element.clone(),
                        Some(child_path.clone()),
                        &[PathStep::Key(key.clone())],
                    )));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use crate::evaluator::FhirPathEngine;
    use serde_json::json;

    #[test]
    fn descendants_reaches_nested_values() {
        let engine = FhirPathEngine::new();
        let resource = json!({
            "resourceType": "Basic",
            "code": {"coding": [{"code": "x"}, {"code": "y"}]}
        });
        let out = engine
            .evaluate("descendants().code", &resource)
            .unwrap();
        assert_eq!(out, vec![json!("x"), json!("y")]);
    }
}
