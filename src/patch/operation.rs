//! A single patch operation and its application state machine.

use serde_json::Value;

use super::error::PatchError;
use super::segment::{self, Tail};
use crate::evaluator::EvaluationContext;
use crate::model::{FhirPathValue, PathStep, ResourceNode, resolve_mut};
use crate::parser;

/// The five structural edit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpType {
    Add,
    Delete,
    Insert,
    Move,
    Replace,
}

impl OpType {
    pub fn as_str(self) -> &'static str {
        match self {
            OpType::Add => "add",
            OpType::Delete => "delete",
            OpType::Insert => "insert",
            OpType::Move => "move",
            OpType::Replace => "replace",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "add" => Some(OpType::Add),
            "delete" => Some(OpType::Delete),
            "insert" => Some(OpType::Insert),
            "move" => Some(OpType::Move),
            "replace" => Some(OpType::Replace),
            _ => None,
        }
    }
}

/// One operation from a patch container. Built by the Parameters codec,
/// validated before any application is attempted and immutable afterwards.
#[derive(Debug, Clone)]
pub struct Operation {
    pub op_type: OpType,
    pub path: String,
    /// Field to create (`add`).
    pub name: Option<String>,
    /// Payload for `add`/`insert`/`replace`.
    pub value: Option<Value>,
    /// The `value[x]` element name the payload arrived under.
    pub value_type: Option<String>,
    /// Target position (`insert`).
    pub index: Option<i64>,
    /// Source position (`move`).
    pub source: Option<i64>,
    /// Destination position (`move`).
    pub destination: Option<i64>,
}

impl Operation {
    /// Checks the required-field contract for this operation type.
    pub fn validate(&self) -> Result<(), PatchError> {
        let missing = |field| PatchError::MissingField {
            op: self.op_type.as_str().to_string(),
            field,
        };
        if self.path.is_empty() {
            return Err(missing("path"));
        }
        match self.op_type {
            OpType::Add => {
                if self.name.is_none() {
                    return Err(missing("name"));
                }
                if self.value.is_none() {
                    return Err(missing("value"));
                }
            }
            OpType::Delete => {}
            OpType::Insert => {
                if self.value.is_none() {
                    return Err(missing("value"));
                }
                if self.index.is_none() {
                    return Err(missing("index"));
                }
            }
            OpType::Move => {
                if self.source.is_none() {
                    return Err(missing("source"));
                }
                if self.destination.is_none() {
                    return Err(missing("destination"));
                }
            }
            OpType::Replace => {
                if self.value.is_none() {
                    return Err(missing("value"));
                }
            }
        }
        Ok(())
    }

    /// Applies this operation to `resource` in place.
    pub(crate) fn apply(&self, resource: &mut Value) -> Result<(), PatchError> {
        log::debug!(
            target: "fhirpatch",
            "applying {} at '{}'", self.op_type.as_str(), self.path
        );
        match self.op_type {
            OpType::Add => self.apply_add(resource),
            OpType::Delete => self.apply_delete(resource),
            OpType::Insert => self.apply_insert(resource),
            OpType::Move => self.apply_move(resource),
            OpType::Replace => self.apply_replace(resource),
        }
    }

    fn apply_add(&self, resource: &mut Value) -> Result<(), PatchError> {
        let targets = evaluate_nodes(resource, &self.path)?;
        let location = first_location(&targets, &self.path)?;
        let target = resolve_mut(resource, &location)
            .ok_or_else(|| self.path_not_found())?;
        let Value::Object(map) = target else {
            return Err(PatchError::invalid_patch(format!(
                "add target '{}' is not an object",
                self.path
            )));
        };
        let name = self.name.clone().unwrap_or_default();
        map.insert(name, self.value.clone().unwrap_or(Value::Null));
        Ok(())
    }

    /// Delete is the one idempotent operation: an unresolved target is a
    /// no-op, never an error.
    fn apply_delete(&self, resource: &mut Value) -> Result<(), PatchError> {
        let tail = segment::tail(&self.path);
        if tail.is_filter {
            // Re-resolve the full path and remove every matched element by
            // its absolute location, deepest indices first so earlier
            // removals do not shift later ones.
            let matches = evaluate_nodes(resource, &self.path)?;
            let mut locations: Vec<Vec<PathStep>> = matches
                .into_iter()
                .filter_map(|node| node.location)
                .collect();
            locations.sort_by(|a, b| compare_locations(b, a));
            for location in locations {
                delete_at(resource, &location);
            }
            return Ok(());
        }

        let containing = segment::containing_path(&self.path);
        let parents = evaluate_nodes(resource, &containing)?;
        let Ok(location) = first_location(&parents, &containing) else {
            return Ok(());
        };
        let Some(parent) = resolve_mut(resource, &location) else {
            return Ok(());
        };
        let Value::Object(map) = parent else {
            return Ok(());
        };
        let Some(field) = &tail.field else {
            return Ok(());
        };
        match tail.index {
            Some(i) => {
                if let Some(Value::Array(items)) = map.get_mut(field)
                    && i < items.len()
                {
                    items.remove(i);
                }
            }
            None => {
                map.shift_remove(field);
            }
        }
        Ok(())
    }

    fn apply_insert(&self, resource: &mut Value) -> Result<(), PatchError> {
        let path = self.path.clone();
        let (map, field) = self.containing_object(resource)?;
        // A missing target field starts life as an empty sequence; an
        // existing non-sequence field is an error, never overwritten.
        let slot = map
            .entry(field)
            .or_insert_with(|| Value::Array(Vec::new()));
        let Value::Array(items) = slot else {
            return Err(PatchError::invalid_patch(format!(
                "insert target '{path}' is not a list"
            )));
        };
        let index = self.index.unwrap_or(0).clamp(0, items.len() as i64) as usize;
        items.insert(index, self.value.clone().unwrap_or(Value::Null));
        Ok(())
    }

    fn apply_move(&self, resource: &mut Value) -> Result<(), PatchError> {
        let path = self.path.clone();
        let (map, field) = self.containing_object(resource)?;
        let Some(Value::Array(items)) = map.get_mut(&field) else {
            return Err(PatchError::PathNotFound { path });
        };
        let source = self.source.unwrap_or(0);
        if source < 0 || source as usize >= items.len() {
            return Err(PatchError::IndexOutOfBounds {
                index: source,
                path,
            });
        }
        let element = items.remove(source as usize);
        let destination =
            self.destination.unwrap_or(0).clamp(0, items.len() as i64) as usize;
        items.insert(destination, element);
        Ok(())
    }

    fn apply_replace(&self, resource: &mut Value) -> Result<(), PatchError> {
        let path = self.path.clone();
        let tail = segment::tail(&self.path);
        let (map, field) = self.containing_object(resource)?;
        let value = self.value.clone().unwrap_or(Value::Null);
        match tail.index {
            Some(i) => {
                let Some(Value::Array(items)) = map.get_mut(&field) else {
                    return Err(PatchError::PathNotFound { path });
                };
                if i >= items.len() {
                    return Err(PatchError::IndexOutOfBounds {
                        index: i as i64,
                        path,
                    });
                }
                items[i] = value;
            }
            None => {
                map.insert(field, value);
            }
        }
        Ok(())
    }

    /// Resolves the containing path to a mutable object and returns it with
    /// the tail field name. Shared by insert, move and replace.
    fn containing_object<'a>(
        &self,
        resource: &'a mut Value,
    ) -> Result<(&'a mut serde_json::Map<String, Value>, String), PatchError> {
        let tail = self.tail_field()?;
        let containing = segment::containing_path(&self.path);
        let parents = evaluate_nodes(resource, &containing)?;
        let location = first_location(&parents, &self.path)?;
        let parent = resolve_mut(resource, &location)
            .ok_or_else(|| self.path_not_found())?;
        let Value::Object(map) = parent else {
            return Err(PatchError::invalid_patch(format!(
                "containing path of '{}' is not an object",
                self.path
            )));
        };
        Ok((map, tail))
    }

    fn tail_field(&self) -> Result<String, PatchError> {
        match segment::tail(&self.path) {
            Tail {
                field: Some(field), ..
            } => Ok(field),
            _ => Err(PatchError::invalid_patch(format!(
                "cannot derive a field name from path '{}'",
                self.path
            ))),
        }
    }

    fn path_not_found(&self) -> PatchError {
        PatchError::PathNotFound {
            path: self.path.clone(),
        }
    }
}

/// Evaluates a patch path and keeps only the node results, which are the
/// only values that carry a document location.
fn evaluate_nodes(resource: &Value, path: &str) -> Result<Vec<ResourceNode>, PatchError> {
    let ast = parser::parse(path)?;
    let mut context = EvaluationContext::new(resource, None);
    let out = context.evaluate_root(&ast)?;
    Ok(out
        .into_iter()
        .filter_map(|item| match item {
            FhirPathValue::Node(node) => Some(node),
            _ => None,
        })
        .collect())
}

fn first_location(nodes: &[ResourceNode], path: &str) -> Result<Vec<PathStep>, PatchError> {
    nodes
        .iter()
        .find_map(|node| node.location.clone())
        .ok_or_else(|| PatchError::PathNotFound {
            path: path.to_string(),
        })
}

fn delete_at(root: &mut Value, location: &[PathStep]) {
    let Some((last, parent)) = location.split_last() else {
        return;
    };
    let Some(parent) = resolve_mut(root, parent) else {
        return;
    };
    match (parent, last) {
        (Value::Object(map), PathStep::Key(key)) => {
            map.shift_remove(key);
        }
        (Value::Array(items), PathStep::Index(i)) => {
            if *i < items.len() {
                items.remove(*i);
            }
        }
        _ => {}
    }
}

fn compare_locations(a: &[PathStep], b: &[PathStep]) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    for (x, y) in a.iter().zip(b) {
        let ord = match (x, y) {
            (PathStep::Index(i), PathStep::Index(j)) => i.cmp(j),
            (PathStep::Key(k), PathStep::Key(l)) => k.cmp(l),
            (PathStep::Key(_), PathStep::Index(_)) => Ordering::Less,
            (PathStep::Index(_), PathStep::Key(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(op_type: OpType, path: &str) -> Operation {
        Operation {
            op_type,
            path: path.to_string(),
            name: None,
            value: None,
            value_type: None,
            index: None,
            source: None,
            destination: None,
        }
    }

    #[test]
    fn validate_enforces_required_fields() {
        assert!(op(OpType::Delete, "Patient.name").validate().is_ok());
        assert!(matches!(
            op(OpType::Insert, "Patient.name").validate(),
            Err(PatchError::MissingField { field: "value", .. })
        ));
        let mut add = op(OpType::Add, "Patient");
        add.name = Some("x".into());
        assert!(matches!(
            add.validate(),
            Err(PatchError::MissingField { field: "value", .. })
        ));
    }

    #[test]
    fn replace_with_false_value_passes_validation() {
        let mut replace = op(OpType::Replace, "Patient.active");
        replace.value = Some(serde_json::Value::Bool(false));
        assert!(replace.validate().is_ok());
    }
}
