//! Runtime type information

use crate::model::value::FhirPathValue;
use std::fmt;

/// A namespace-qualified type name, as produced by `type()` and consumed by
/// `is` / `ofType`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    /// `System` for primitive value types, `FHIR` for resource types; an
    /// unqualified specifier leaves this unset and matches either
    pub namespace: Option<String>,
    /// Type name
    pub name: String,
}

impl TypeInfo {
    /// Split a qualified specifier (`System.Integer`, `Patient`).
    pub fn from_specifier(specifier: &str) -> Self {
        match specifier.split_once('.') {
            Some((namespace, name)) => TypeInfo {
                namespace: Some(namespace.to_string()),
                name: name.to_string(),
            },
            None => TypeInfo {
                namespace: None,
                name: specifier.to_string(),
            },
        }
    }

    /// The runtime type of a value.
    pub fn of(value: &FhirPathValue) -> Self {
        let (namespace, name) = match value {
            FhirPathValue::Boolean(_) => ("System", "Boolean"),
            FhirPathValue::Integer(_) => ("System", "Integer"),
            FhirPathValue::Decimal(_) => ("System", "Decimal"),
            FhirPathValue::String(_) => ("System", "String"),
            FhirPathValue::Date(_) => ("System", "Date"),
            FhirPathValue::DateTime(_) => ("System", "DateTime"),
            FhirPathValue::Time(_) => ("System", "Time"),
            FhirPathValue::Quantity(_) => ("System", "Quantity"),
            FhirPathValue::TypeInfo(_) => ("System", "TypeInfo"),
            FhirPathValue::Node(node) => {
                return TypeInfo {
                    namespace: Some("FHIR".to_string()),
                    name: node.path.clone().unwrap_or_else(|| "Element".to_string()),
                };
            }
        };
        TypeInfo {
            namespace: Some(namespace.to_string()),
            name: name.to_string(),
        }
    }

    /// Whether `value` matches this specifier. Primitive names match case
    /// insensitively so both `string` (FHIR) and `String` (System) work;
    /// nodes match on their resolved type path.
    pub fn matches(&self, value: &FhirPathValue) -> bool {
        if let FhirPathValue::Node(node) = value {
            if node.path.as_deref() == Some(self.name.as_str()) {
                return true;
            }
            // a node wrapping a primitive still answers for the value type
            let unwrapped = value.unwrapped();
            if !matches!(unwrapped, FhirPathValue::Node(_)) {
                return self.matches(&unwrapped);
            }
            return false;
        }
        let actual = TypeInfo::of(value);
        if let (Some(want), Some(have)) = (&self.namespace, &actual.namespace)
            && !want.eq_ignore_ascii_case(have)
        {
            return false;
        }
        self.name.eq_ignore_ascii_case(&actual.name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{namespace}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}
