//! Variable scopes and precedence-ordered lookup

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::Result;

/// A single source of named variables.
///
/// Built from a JSON object carrying an optional nested `vars` mapping.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: Map<String, Value>,
}

impl Scope {
    /// An empty scope
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a scope from a JSON object with an optional `vars` member.
    /// Anything else yields an empty scope.
    pub fn from_json(value: &Value) -> Self {
        let vars = value
            .get("vars")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Self { vars }
    }

    /// Build a scope directly from a variable mapping
    pub fn from_vars(vars: Map<String, Value>) -> Self {
        Self { vars }
    }

    /// Look up a variable, treating falsy entries as absent
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name).filter(|v| is_truthy(v))
    }
}

/// The three scopes consulted during expansion, highest precedence first:
/// event, trigger, config.
#[derive(Debug, Clone, Default)]
pub struct ScopeSet {
    pub event: Scope,
    pub trigger: Scope,
    pub config: Scope,
}

impl ScopeSet {
    /// Create a scope set without an event scope
    pub fn new(trigger: Scope, config: Scope) -> Self {
        Self {
            event: Scope::empty(),
            trigger,
            config,
        }
    }

    /// Attach an event scope
    pub fn with_event(mut self, event: Scope) -> Self {
        self.event = event;
        self
    }

    /// Build from a JSON document with optional `event`, `trigger` and
    /// `config` members
    pub fn from_json(value: &Value) -> Self {
        let scope = |key: &str| value.get(key).map(Scope::from_json).unwrap_or_default();
        Self {
            event: scope("event"),
            trigger: scope("trigger"),
            config: scope("config"),
        }
    }

    /// Load a scope document from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let document: Value = serde_json::from_str(&content)?;
        Ok(Self::from_json(&document))
    }

    /// Resolve the raw value of `name`.
    ///
    /// Precedence is by truthiness, not key presence: an empty string, `0`
    /// or `false` in a higher scope falls through to the next one.
    pub fn resolve_raw(&self, name: &str) -> Value {
        self.event
            .get(name)
            .or_else(|| self.trigger.get(name))
            .or_else(|| self.config.get(name))
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()))
    }
}

/// Truthiness of a JSON value: null, false, zero and "" are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
