//! FHIR patch application.
//!
//! A patch is a `Parameters` resource listing add/delete/insert/move/replace
//! operations, each addressing its target through a FHIRPath expression.
//! The path's trailing segment is decomposed into a concrete field name or
//! array index; everything before it is resolved with the evaluator, and the
//! document is mutated in place through the resolved node's location.

mod cleanup;
mod container;
mod error;
mod operation;
mod params;
mod segment;

pub use container::FhirPatch;
pub use error::PatchError;
pub use operation::{OpType, Operation};
