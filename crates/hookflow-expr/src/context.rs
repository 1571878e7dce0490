//! Evaluation context: the root values expressions can see.

use crate::value::Value;
use hookflow_core::StepOutcome;
use std::collections::BTreeMap;

/// Roots available to expressions (`event`, `env`, `steps`) plus the
/// outcomes of steps that already finished in the current workflow run,
/// which back the `success()`/`failure()`/`cancelled()` builtins.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    pub event: Value,
    pub env: Value,
    pub steps: Value,
    pub prior_outcomes: Vec<StepOutcome>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a root identifier. Unknown roots are missing data, not an
    /// error.
    pub fn root(&self, name: &str) -> Value {
        match name {
            "event" => self.event.clone(),
            "env" => self.env.clone(),
            "steps" => self.steps.clone(),
            _ => Value::Null,
        }
    }

    /// Build the `env` root from string pairs.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: BTreeMap<String, Value> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect();
        self.env = Value::Map(map);
        self
    }
}
