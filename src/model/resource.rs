//! Resource node wrappers
//!
//! A [`ResourceNode`] pairs a document subtree with its schema type path
//! (used for type filters and choice-type resolution) and, when the node was
//! reached by navigating from the document root, the concrete access trail
//! back to it. The evaluator never mutates through a node; the patch engine
//! re-navigates `location` against the mutable root instead.

use serde_json::Value;

/// One step of a concrete access trail from the document root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// Object member access
    Key(String),
    /// Array element access
    Index(usize),
}

/// A document subtree plus its derived type path and location
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    /// The wrapped value
    pub data: Value,
    /// Dotted schema type path from the document root, with polymorphic
    /// suffixes resolved (`Patient.contact.name`); `None` for values whose
    /// type is unknown
    pub path: Option<String>,
    /// Access trail from the document root; `None` for detached values such
    /// as external variables
    pub location: Option<Vec<PathStep>>,
}

impl ResourceNode {
    /// Wrap the document root. The type path comes from `resourceType`.
    pub fn root(resource: &Value) -> Self {
        let path = resource
            .get("resourceType")
            .and_then(Value::as_str)
            .map(str::to_string);
        ResourceNode {
            data: resource.clone(),
            path,
            location: Some(Vec::new()),
        }
    }

    /// Wrap a value with an explicit type path and no location.
    pub fn with_path(data: Value, path: impl Into<String>) -> Self {
        ResourceNode {
            data,
            path: Some(path.into()),
            location: None,
        }
    }

    /// Wrap a value that is not part of the working document. Objects that
    /// carry a `resourceType` still get a type path so type filters work.
    pub fn detached(data: Value) -> Self {
        let path = data
            .get("resourceType")
            .and_then(Value::as_str)
            .map(str::to_string);
        ResourceNode {
            data,
            path,
            location: None,
        }
    }

    /// Wrap a child value reached from this node.
    pub fn child(&self, data: Value, path: Option<String>, steps: &[PathStep]) -> Self {
        let location = self.location.as_ref().map(|loc| {
            let mut extended = loc.clone();
            extended.extend_from_slice(steps);
            extended
        });
        ResourceNode {
            data,
            path,
            location,
        }
    }

    /// Child type path for a member of this node.
    pub fn child_path(&self, key: &str) -> String {
        match &self.path {
            Some(path) => format!("{path}.{key}"),
            None => key.to_string(),
        }
    }
}

/// Navigate a mutable document by an access trail, yielding the target value.
pub fn resolve_mut<'a>(root: &'a mut Value, location: &[PathStep]) -> Option<&'a mut Value> {
    let mut current = root;
    for step in location {
        current = match step {
            PathStep::Key(key) => current.get_mut(key.as_str())?,
            PathStep::Index(idx) => current.get_mut(idx)?,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn root_path_comes_from_resource_type() {
        let node = ResourceNode::root(&json!({"resourceType": "Patient"}));
        assert_eq!(node.path.as_deref(), Some("Patient"));
        assert_eq!(node.location.as_deref(), Some(&[][..]));
    }

    #[test]
    fn child_extends_location() {
        let node = ResourceNode::root(&json!({"resourceType": "Patient", "name": [{"family": "x"}]}));
        let child = node.child(
            json!({"family": "x"}),
            Some("Patient.name".into()),
            &[PathStep::Key("name".into()), PathStep::Index(0)],
        );
        assert_eq!(
            child.location.as_deref(),
            Some(&[PathStep::Key("name".into()), PathStep::Index(0)][..])
        );
    }

    #[test]
    fn resolve_mut_navigates_nested_structure() {
        let mut doc = json!({"a": [{"b": 1}, {"b": 2}]});
        let steps = vec![
            PathStep::Key("a".into()),
            PathStep::Index(1),
            PathStep::Key("b".into()),
        ];
        *resolve_mut(&mut doc, &steps).unwrap() = json!(9);
        assert_eq!(doc, json!({"a": [{"b": 1}, {"b": 9}]}));
    }
}
