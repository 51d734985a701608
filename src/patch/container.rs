//! The patch container: an ordered list of operations applied in sequence
//! against one working copy of a document.

use serde_json::Value;

use super::cleanup::cleanup;
use super::error::PatchError;
use super::operation::Operation;
use super::{params, segment};

/// A parsed, validated patch.
///
/// Operations apply strictly in order against a single working copy, so a
/// later operation sees the effects of every earlier one. There is no
/// rollback: if operation *k* fails the error carries, and the caller still
/// holds its original document untouched because `apply` works on a clone.
#[derive(Debug, Clone, Default)]
pub struct FhirPatch {
    operations: Vec<Operation>,
}

impl FhirPatch {
    /// Builds a patch from a `Parameters` resource in JSON object form.
    pub fn from_value(params: &Value) -> Result<Self, PatchError> {
        Ok(FhirPatch {
            operations: params::parse_parameters(params)?,
        })
    }

    /// Builds a patch from `Parameters` JSON text.
    pub fn from_json(text: &str) -> Result<Self, PatchError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| PatchError::invalid_patch(format!("malformed patch JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// One-shot convenience: parse `patch` and apply it to `resource`.
    pub fn apply_to(resource: &Value, patch: &Value) -> Result<Value, PatchError> {
        Self::from_value(patch)?.apply(resource)
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Renders the patch back into its `Parameters` wire form.
    pub fn to_value(&self) -> Value {
        params::to_parameters(&self.operations)
    }

    /// Applies every operation in order and returns the cleaned result.
    /// Operations addressing a different resource type than the document
    /// are skipped rather than failed.
    pub fn apply(&self, resource: &Value) -> Result<Value, PatchError> {
        let resource_type = resource
            .get("resourceType")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                PatchError::invalid_resource("document has no resourceType")
            })?
            .to_string();

        let mut working = resource.clone();
        for operation in &self.operations {
            if segment::root(&operation.path) != resource_type {
                log::debug!(
                    target: "fhirpatch",
                    "skipping {} at '{}': path does not address a {}",
                    operation.op_type.as_str(), operation.path, resource_type
                );
                continue;
            }
            operation.apply(&mut working)?;
        }
        Ok(cleanup(working).unwrap_or_else(|| Value::Object(serde_json::Map::new())))
    }

    /// String-in/string-out variant for callers holding serialized JSON.
    pub fn apply_to_json(&self, resource: &str) -> Result<String, PatchError> {
        let value: Value = serde_json::from_str(resource).map_err(|e| {
            PatchError::invalid_resource(format!("malformed resource JSON: {e}"))
        })?;
        let patched = self.apply(&value)?;
        serde_json::to_string(&patched).map_err(|e| {
            PatchError::invalid_resource(format!("serialization failed: {e}"))
        })
    }
}
