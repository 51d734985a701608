//! Core value type for FHIRPath expressions
//!
//! Every evaluation result is a [`Collection`]: length zero means
//! empty/unknown, length one is a singleton, anything longer is a true
//! collection. Individual values are the tagged [`FhirPathValue`] enum.

use crate::model::quantity::Quantity;
use crate::model::resource::ResourceNode;
use crate::model::temporal::{FpDateTime, FpTime};
use crate::model::types::TypeInfo;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Number, Value};
use std::fmt;

/// An ordered collection of values; the result type of every evaluation
pub type Collection = Vec<FhirPathValue>;

/// A single FHIRPath value
#[derive(Debug, Clone, PartialEq)]
pub enum FhirPathValue {
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Decimal value
    Decimal(Decimal),
    /// String value
    String(String),
    /// Date with partial precision
    Date(FpDateTime),
    /// DateTime with partial precision and optional timezone
    DateTime(FpDateTime),
    /// Time of day with partial precision
    Time(FpTime),
    /// Quantity with unit
    Quantity(Quantity),
    /// Type information produced by `type()`
    TypeInfo(TypeInfo),
    /// A document subtree with its type path and location
    Node(ResourceNode),
}

impl FhirPathValue {
    /// Short type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            FhirPathValue::Boolean(_) => "Boolean",
            FhirPathValue::Integer(_) => "Integer",
            FhirPathValue::Decimal(_) => "Decimal",
            FhirPathValue::String(_) => "String",
            FhirPathValue::Date(_) => "Date",
            FhirPathValue::DateTime(_) => "DateTime",
            FhirPathValue::Time(_) => "Time",
            FhirPathValue::Quantity(_) => "Quantity",
            FhirPathValue::TypeInfo(_) => "TypeInfo",
            FhirPathValue::Node(_) => "Node",
        }
    }

    /// Convert a JSON scalar into its value-model form; objects and arrays
    /// become detached nodes.
    pub fn from_json(value: &Value) -> FhirPathValue {
        match value {
            Value::Bool(b) => FhirPathValue::Boolean(*b),
            Value::Number(n) => number_value(n),
            Value::String(s) => FhirPathValue::String(s.clone()),
            other => FhirPathValue::Node(ResourceNode::detached(other.clone())),
        }
    }

    /// Wrap a JSON value as a collection: arrays spread into elements,
    /// `null` is empty, everything else is a singleton.
    pub fn collection_from_json(value: &Value) -> Collection {
        match value {
            Value::Null => Vec::new(),
            Value::Array(items) => items.iter().map(FhirPathValue::from_json).collect(),
            other => vec![FhirPathValue::from_json(other)],
        }
    }

    /// Resolve a node wrapping a scalar to the scalar itself; non-node
    /// values and nodes over objects/arrays come back unchanged.
    pub fn unwrapped(&self) -> FhirPathValue {
        match self {
            FhirPathValue::Node(node) => match &node.data {
                Value::Bool(b) => FhirPathValue::Boolean(*b),
                Value::Number(n) => number_value(n),
                Value::String(s) => FhirPathValue::String(s.clone()),
                _ => self.clone(),
            },
            other => other.clone(),
        }
    }

    /// Render as JSON for final results and structural comparison.
    pub fn to_json(&self) -> Value {
        match self {
            FhirPathValue::Boolean(b) => Value::Bool(*b),
            FhirPathValue::Integer(n) => Value::Number((*n).into()),
            FhirPathValue::Decimal(d) => decimal_to_json(*d),
            FhirPathValue::String(s) => Value::String(s.clone()),
            FhirPathValue::Date(d) | FhirPathValue::DateTime(d) => Value::String(d.to_string()),
            FhirPathValue::Time(t) => Value::String(t.to_string()),
            FhirPathValue::Quantity(q) => serde_json::json!({
                "value": decimal_to_json(q.value),
                "unit": q.unit,
            }),
            FhirPathValue::TypeInfo(t) => Value::String(t.to_string()),
            FhirPathValue::Node(node) => node.data.clone(),
        }
    }

    /// Numeric view accepting both integers and decimals.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self.unwrapped() {
            FhirPathValue::Integer(n) => Some(Decimal::from(n)),
            FhirPathValue::Decimal(d) => Some(d),
            _ => None,
        }
    }

    /// Integer view; decimals qualify only when integral.
    pub fn as_integer(&self) -> Option<i64> {
        match self.unwrapped() {
            FhirPathValue::Integer(n) => Some(n),
            FhirPathValue::Decimal(d) if d.is_integer() => d.to_i64(),
            _ => None,
        }
    }

    /// String view (after node unwrapping).
    pub fn as_string(&self) -> Option<String> {
        match self.unwrapped() {
            FhirPathValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean view (after node unwrapping).
    pub fn as_boolean(&self) -> Option<bool> {
        match self.unwrapped() {
            FhirPathValue::Boolean(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for FhirPathValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FhirPathValue::Boolean(b) => write!(f, "{b}"),
            FhirPathValue::Integer(n) => write!(f, "{n}"),
            FhirPathValue::Decimal(d) => write!(f, "{d}"),
            FhirPathValue::String(s) => f.write_str(s),
            FhirPathValue::Date(d) | FhirPathValue::DateTime(d) => write!(f, "{d}"),
            FhirPathValue::Time(t) => write!(f, "{t}"),
            FhirPathValue::Quantity(q) => write!(f, "{q}"),
            FhirPathValue::TypeInfo(t) => write!(f, "{t}"),
            FhirPathValue::Node(node) => write!(f, "{}", node.data),
        }
    }
}

/// True when the collection is the single boolean `true`.
pub(crate) fn is_true(collection: &[FhirPathValue]) -> bool {
    collection.len() == 1 && collection[0].as_boolean() == Some(true)
}

fn number_value(n: &Number) -> FhirPathValue {
    if let Some(i) = n.as_i64() {
        FhirPathValue::Integer(i)
    } else if let Some(f) = n.as_f64()
        && let Ok(d) = Decimal::try_from(f)
    {
        FhirPathValue::Decimal(d)
    } else {
        // out of Decimal range; fall back to the textual form
        FhirPathValue::String(n.to_string())
    }
}

fn decimal_to_json(d: Decimal) -> Value {
    if d.is_integer()
        && let Some(i) = d.to_i64()
    {
        return Value::Number(i.into());
    }
    match d.to_f64().and_then(Number::from_f64) {
        Some(n) => Value::Number(n),
        None => Value::String(d.to_string()),
    }
}
