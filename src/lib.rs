//! FHIRPath evaluation and FHIRPatch application for FHIR resources
//!
//! This crate evaluates FHIRPath expressions against FHIR resources and uses
//! them to apply FHIRPatch (`Parameters`-encoded) structural edits. The two
//! halves share one value model: every expression evaluates to an ordered
//! collection, and patch operations resolve their targets by evaluating the
//! operation's path against the working resource.
//!
//! ```no_run
//! use fhirpatch::FhirPatch;
//! use serde_json::json;
//!
//! let patch = FhirPatch::from_value(&json!({
//!     "resourceType": "Parameters",
//!     "parameter": [{
//!         "name": "operation",
//!         "part": [
//!             {"name": "type", "valueCode": "replace"},
//!             {"name": "path", "valueString": "Patient.birthDate"},
//!             {"name": "value", "valueDate": "1930-01-01"},
//!         ],
//!     }],
//! })).unwrap();
//! let patched = patch
//!     .apply(&json!({"resourceType": "Patient", "birthDate": "1920-01-01"}))
//!     .unwrap();
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod parser;
pub mod patch;
pub mod registry;

pub use ast::ExpressionNode;
pub use error::FhirPathError;
pub use evaluator::{EvaluationContext, EvaluationError, FhirPathEngine};
pub use model::{FhirPathValue, ModelInfo, ResourceNode};
pub use parser::{ParseError, parse};
pub use patch::{FhirPatch, OpType, Operation, PatchError};
