//! Value and type model for FHIRPath evaluation
//!
//! Everything an expression can produce lives here: scalar values, temporal
//! values with partial precision, quantities with units, and
//! [`ResourceNode`] wrappers that tie a document subtree to its schema type
//! path and its concrete location in the document.

mod provider;
mod quantity;
mod resource;
mod temporal;
mod types;
mod value;

pub use provider::ModelInfo;
pub use quantity::Quantity;
pub use resource::{PathStep, ResourceNode, resolve_mut};
pub use temporal::{FpDateTime, FpTime, TemporalPrecision};
pub use types::TypeInfo;
pub use value::{Collection, FhirPathValue};

pub(crate) use value::is_true;
