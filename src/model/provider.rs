//! Pluggable schema model
//!
//! Consumers may describe their document schema through two lookup tables.
//! Without a model the evaluator performs no path redirection and no choice
//! type probing, which is sufficient for plain structural navigation.

use rustc_hash::FxHashMap;

/// Schema knowledge the evaluator consults during member navigation
#[derive(Debug, Clone, Default)]
pub struct ModelInfo {
    /// Redirects a computed child path to its canonical schema path, e.g.
    /// `Observation.component.valueQuantity` entries that live under a
    /// shared definition.
    pub paths_defined_elsewhere: FxHashMap<String, String>,
    /// For a polymorphic (choice type) child path, the ordered list of
    /// concrete field-name suffixes to probe (`["String", "Quantity"]` for
    /// `value[x]` fields).
    pub choice_type_paths: FxHashMap<String, Vec<String>>,
}

impl ModelInfo {
    /// A model with no redirections and no choice types.
    pub fn empty() -> Self {
        ModelInfo::default()
    }
}
