//! Post-apply cleanup: FHIR forbids empty containers in the JSON form, so
//! after a patch runs, empty arrays, empty objects and nulls are pruned
//! recursively. Meaningful falsy scalars (`false`, `0`, `""`) survive.

use serde_json::{Map, Value};

pub(crate) fn cleanup(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Array(items) => {
            let cleaned: Vec<Value> = items.into_iter().filter_map(cleanup).collect();
            if cleaned.is_empty() {
                None
            } else {
                Some(Value::Array(cleaned))
            }
        }
        Value::Object(map) => {
            let mut cleaned = Map::new();
            for (key, item) in map {
                if let Some(kept) = cleanup(item) {
                    cleaned.insert(key, kept);
                }
            }
            if cleaned.is_empty() {
                None
            } else {
                Some(Value::Object(cleaned))
            }
        }
        scalar => Some(scalar),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn drops_empty_containers_but_keeps_false() {
        let input = json!({"a": [], "b": false, "c": {"d": null}});
        assert_eq!(cleanup(input), Some(json!({"b": false})));
    }

    #[test]
    fn keeps_zero_and_empty_string() {
        let input = json!({"n": 0, "s": "", "gone": {}});
        assert_eq!(cleanup(input), Some(json!({"n": 0, "s": ""})));
    }

    #[test]
    fn prunes_transitively_emptied_parents() {
        let input = json!({"a": {"b": {"c": []}}, "keep": 1});
        assert_eq!(cleanup(input), Some(json!({"keep": 1})));
    }
}
