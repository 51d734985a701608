//! Evaluation context: root resource, environment variables and the
//! lambda frame stack that backs `$this`, `$index` and `$total`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Local;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::model::{Collection, FhirPathValue, FpDateTime, ModelInfo, ResourceNode};

/// One level of lambda scope. Pushed for every `Expr`-typed argument so
/// that nested `where`/`select`/`aggregate` calls see their own bindings.
pub(crate) struct Frame {
    pub this: Collection,
    pub index: Option<i64>,
    pub total: Collection,
}

/// All state for a single evaluation run. Created fresh per expression;
/// `now()`/`today()` are memoized so repeated calls within one run agree.
pub struct EvaluationContext {
    root: Collection,
    vars: FxHashMap<String, Collection>,
    model: Option<Arc<ModelInfo>>,
    frames: Vec<Frame>,
    now: Option<FpDateTime>,
    today: Option<FpDateTime>,
}

impl EvaluationContext {
    pub fn new(resource: &Value, model: Option<Arc<ModelInfo>>) -> Self {
        let root: Collection = vec![FhirPathValue::Node(ResourceNode::root(resource))];
        let mut vars = FxHashMap::default();
        vars.insert(
            "ucum".to_string(),
            vec![FhirPathValue::String("http://unitsofmeasure.org".to_string())],
        );
        vars.insert("context".to_string(), root.clone());
        EvaluationContext {
            root,
            vars,
            model,
            frames: Vec::new(),
            now: None,
            today: None,
        }
    }

    /// Registers caller-supplied environment variables, available in
    /// expressions as `%name`.
    pub fn set_variables(&mut self, vars: &HashMap<String, Value>) {
        for (name, value) in vars {
            self.vars
                .insert(name.clone(), FhirPathValue::collection_from_json(value));
        }
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: &Value) {
        self.vars
            .insert(name.into(), FhirPathValue::collection_from_json(value));
    }

    pub(crate) fn root(&self) -> &Collection {
        &self.root
    }

    pub(crate) fn model(&self) -> Option<&ModelInfo> {
        self.model.as_deref()
    }

    pub(crate) fn variable(&self, name: &str) -> Option<&Collection> {
        self.vars.get(name)
    }

    pub(crate) fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub(crate) fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// `$this` resolves to the innermost frame, or the root collection when
    /// no lambda is active.
    pub(crate) fn current_this(&self) -> Collection {
        match self.frames.last() {
            Some(frame) => frame.this.clone(),
            None => self.root.clone(),
        }
    }

    pub(crate) fn current_index(&self) -> Option<i64> {
        self.frames.last().and_then(|frame| frame.index)
    }

    pub(crate) fn current_total(&self) -> Collection {
        match self.frames.last() {
            Some(frame) => frame.total.clone(),
            None => Vec::new(),
        }
    }

    /// Current instant, captured once per evaluation run.
    pub(crate) fn now(&mut self) -> Option<FpDateTime> {
        if self.now.is_none() {
            let text = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string();
            self.now = FpDateTime::parse(&text);
        }
        self.now.clone()
    }

    /// Current date, captured once per evaluation run.
    pub(crate) fn today(&mut self) -> Option<FpDateTime> {
        if self.today.is_none() {
            let text = Local::now().format("%Y-%m-%d").to_string();
            self.today = FpDateTime::parse(&text);
        }
        self.today.clone()
    }
}
