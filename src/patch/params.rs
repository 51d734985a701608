//! Codec between the FHIR `Parameters` wire form and [`Operation`] records.
//!
//! A patch arrives as a `Parameters` resource whose entries each carry an
//! `operation` part list: `type` as a code, `path` as a string, and the
//! type-specific fields (`name`, `value[x]`, `index`, `source`,
//! `destination`).

use serde_json::{Map, Value, json};

use super::error::PatchError;
use super::operation::{OpType, Operation};

pub(crate) fn parse_parameters(params: &Value) -> Result<Vec<Operation>, PatchError> {
    let Value::Object(map) = params else {
        return Err(PatchError::invalid_patch("patch is not an object"));
    };
    match map.get("resourceType").and_then(Value::as_str) {
        Some("Parameters") => {}
        other => {
            return Err(PatchError::invalid_resource(format!(
                "invalid resource type for a patch: {}",
                other.unwrap_or("<missing>")
            )));
        }
    }
    let entries = match map.get("parameter") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(PatchError::invalid_patch(
                "'parameter' must be a list of operations",
            ));
        }
    };
    entries.iter().map(parse_operation).collect()
}

/// One `parameter` entry into an [`Operation`], validated before return.
/// The part list is accepted under either `part` (the standard `Parameters`
/// nesting) or `parameter` (the legacy flat form).
fn parse_operation(entry: &Value) -> Result<Operation, PatchError> {
    let parts = part_list(entry).ok_or_else(|| {
        PatchError::invalid_patch("operation entry has no part list")
    })?;

    let mut op_type = None;
    let mut path = String::new();
    let mut name = None;
    let mut value = None;
    let mut value_type = None;
    let mut index = None;
    let mut source = None;
    let mut destination = None;

    for part in parts {
        let part_name = part.get("name").and_then(Value::as_str).unwrap_or_default();
        match part_name {
            "type" => {
                let code = part
                    .get("valueCode")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        PatchError::invalid_patch("'type' part has no valueCode")
                    })?;
                op_type = Some(OpType::from_code(code).ok_or_else(|| {
                    PatchError::UnsupportedOperation {
                        op: code.to_string(),
                    }
                })?);
            }
            "path" => {
                path = part
                    .get("valueString")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
            }
            "name" => {
                name = part
                    .get("valueString")
                    .and_then(Value::as_str)
                    .map(str::to_string);
            }
            "value" => {
                let (key, payload) = extract_value(part)?;
                value_type = Some(key);
                value = Some(payload);
            }
            "index" => index = part.get("valueInteger").and_then(Value::as_i64),
            "source" => source = part.get("valueInteger").and_then(Value::as_i64),
            "destination" => destination = part.get("valueInteger").and_then(Value::as_i64),
            other => {
                return Err(PatchError::invalid_patch(format!(
                    "unrecognized operation parameter '{other}'"
                )));
            }
        }
    }

    let op_type = op_type.ok_or(PatchError::MissingField {
        op: "operation".to_string(),
        field: "type",
    })?;
    let operation = Operation {
        op_type,
        path,
        name,
        value,
        value_type,
        index,
        source,
        destination,
    };
    operation.validate()?;
    Ok(operation)
}

/// Pulls the payload out of a `value[x]` element. Complex payloads may also
/// arrive as a nested part list, which folds into a list of single-field
/// objects.
fn part_list(entry: &Value) -> Option<&Vec<Value>> {
    entry
        .get("part")
        .or_else(|| entry.get("parameter"))
        .and_then(Value::as_array)
}

fn extract_value(part: &Value) -> Result<(String, Value), PatchError> {
    if let Some(nested) = part_list(part) {
        let folded: Result<Vec<Value>, PatchError> = nested
            .iter()
            .map(|inner| {
                let name = inner
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let (_, payload) = extract_value(inner)?;
                let mut wrapped = Map::new();
                wrapped.insert(name, payload);
                Ok(Value::Object(wrapped))
            })
            .collect();
        return Ok(("parameter".to_string(), Value::Array(folded?)));
    }
    part.as_object()
        .and_then(|map| {
            map.iter()
                .find(|(key, _)| key.starts_with("value"))
                .map(|(key, payload)| (key.clone(), payload.clone()))
        })
        .ok_or_else(|| {
            PatchError::invalid_patch(format!("unsupported value element: {part}"))
        })
}

/// Renders operations back into the `Parameters` wire form.
pub(crate) fn to_parameters(operations: &[Operation]) -> Value {
    let parameter: Vec<Value> = operations.iter().map(operation_to_value).collect();
    json!({
        "resourceType": "Parameters",
        "parameter": parameter,
    })
}

fn operation_to_value(operation: &Operation) -> Value {
    let mut parts = vec![
        json!({"name": "type", "valueCode": operation.op_type.as_str()}),
        json!({"name": "path", "valueString": operation.path}),
    ];
    if let Some(name) = &operation.name {
        parts.push(json!({"name": "name", "valueString": name}));
    }
    if let Some(value) = &operation.value {
        let key = operation
            .value_type
            .clone()
            .unwrap_or_else(|| "valueString".to_string());
        let mut part = Map::new();
        part.insert("name".to_string(), Value::String("value".to_string()));
        part.insert(key, value.clone());
        parts.push(Value::Object(part));
    }
    if let Some(index) = operation.index {
        parts.push(json!({"name": "index", "valueInteger": index}));
    }
    if let Some(source) = operation.source {
        parts.push(json!({"name": "source", "valueInteger": source}));
    }
    if let Some(destination) = operation.destination {
        parts.push(json!({"name": "destination", "valueInteger": destination}));
    }
    json!({"name": "operation", "parameter": parts})
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_a_delete_operation() {
        let patch = json!({
            "resourceType": "Parameters",
            "parameter": [{
                "name": "operation",
                "parameter": [
                    {"name": "type", "valueCode": "delete"},
                    {"name": "path", "valueString": "Practitioner.telecom.where(value='6564664444')"},
                ]
            }]
        });
        let ops = parse_parameters(&patch).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].op_type, OpType::Delete);
        assert_eq!(ops[0].path, "Practitioner.telecom.where(value='6564664444')");
    }

    #[test]
    fn rejects_a_non_list_parameter_field() {
        let patch = json!({"resourceType": "Parameters", "parameter": "bar"});
        assert!(matches!(
            parse_parameters(&patch),
            Err(PatchError::InvalidPatch { .. })
        ));
    }

    #[test]
    fn rejects_non_parameters_resources() {
        let patch = json!({"resourceType": "Patient"});
        assert!(parse_parameters(&patch).is_err());
    }

    #[test]
    fn round_trips_an_insert_operation() {
        let patch = json!({
            "resourceType": "Parameters",
            "parameter": [{
                "name": "operation",
                "parameter": [
                    {"name": "type", "valueCode": "insert"},
                    {"name": "path", "valueString": "Practitioner.telecom"},
                    {"name": "value", "valueContactPoint": {"system": "phone", "value": "7577467896"}},
                    {"name": "index", "valueInteger": 0},
                ]
            }]
        });
        let ops = parse_parameters(&patch).unwrap();
        assert_eq!(ops[0].value_type.as_deref(), Some("valueContactPoint"));
        assert_eq!(to_parameters(&ops), patch);
    }
}
