//! Recursive placeholder expansion
//!
//! Every `${...}` in a template is resolved concurrently: parse, scope
//! lookup, recursive re-expansion of string values, filters, encoding.
//! Results are committed into the output buffer strictly in the order the
//! placeholders appear, and each result lands in the exact slot its
//! placeholder occupied.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use futures::stream::{FuturesOrdered, StreamExt};
use futures::FutureExt;
use serde_json::{Map, Value};

use super::digest::{DigestProvider, Sha384Digest};
use super::encoder::{encode_vars, stringify};
use super::filters::FilterRegistry;
use super::parser::{parse_placeholder, scan_placeholders};
use super::scope::ScopeSet;
use super::types::PlaceholderMatch;
use crate::config::ExpanderConfig;
use crate::metrics::ExpansionMetrics;

/// Default number of nested re-expansions
pub const DEFAULT_BUDGET: i32 = 2;

/// Per-call expansion settings
#[derive(Debug, Clone)]
pub struct ExpansionOptions {
    /// Nested re-expansions allowed; expansion stops once it goes negative
    pub budget: i32,

    /// Percent-encode each resolved value
    pub encode: bool,

    /// Variables left untouched as `${...}`
    pub freeze_vars: HashSet<String>,
}

impl Default for ExpansionOptions {
    fn default() -> Self {
        Self {
            budget: DEFAULT_BUDGET,
            encode: true,
            freeze_vars: HashSet::new(),
        }
    }
}

impl ExpansionOptions {
    pub fn from_config(config: &ExpanderConfig) -> Self {
        Self {
            budget: config.budget,
            encode: config.encode,
            freeze_vars: config.freeze_vars.iter().cloned().collect(),
        }
    }

    pub fn with_budget(mut self, budget: i32) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_encode(mut self, encode: bool) -> Self {
        self.encode = encode;
        self
    }

    pub fn freeze(mut self, name: impl Into<String>) -> Self {
        self.freeze_vars.insert(name.into());
        self
    }
}

/// The expansion engine.
///
/// Construct once per host and share it (see [`create_expander`]); the
/// filter registry is the only state and concurrent `expand` calls do not
/// interfere with each other.
pub struct Expander {
    filters: FilterRegistry,
}

impl Default for Expander {
    fn default() -> Self {
        Self::new(Some(Arc::new(Sha384Digest)))
    }
}

impl Expander {
    /// Create an expander with the built-in filters
    pub fn new(digest: Option<Arc<dyn DigestProvider>>) -> Self {
        Self {
            filters: FilterRegistry::new(digest),
        }
    }

    /// Create an expander around an existing registry
    pub fn with_registry(filters: FilterRegistry) -> Self {
        Self { filters }
    }

    /// The filter registry, for registering host filters
    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    /// Percent-encode a value the way expanded placeholders are encoded
    pub fn encode_vars(&self, value: &Value) -> String {
        encode_vars(value)
    }

    /// Expand every placeholder in `template`.
    ///
    /// Never fails: malformed placeholders, unknown filters and exhausted
    /// budgets are logged and degrade to best-effort output.
    #[tracing::instrument(name = "expander.expand", skip(self, scopes, options), fields(budget = options.budget))]
    pub async fn expand(
        &self,
        template: &str,
        scopes: &ScopeSet,
        options: &ExpansionOptions,
    ) -> String {
        ExpansionMetrics::record_expansion();
        self.expand_with_budget(template, scopes, options, options.budget)
            .await
    }

    /// Expand every string (object keys included) inside a JSON document.
    /// Numbers, booleans and null pass through unchanged.
    pub fn expand_json<'a>(
        &'a self,
        value: &'a Value,
        scopes: &'a ScopeSet,
        options: &'a ExpansionOptions,
    ) -> BoxFuture<'a, Value> {
        async move {
            match value {
                Value::String(s) => Value::String(self.expand(s, scopes, options).await),
                Value::Array(items) => Value::Array(
                    join_all(items.iter().map(|v| self.expand_json(v, scopes, options))).await,
                ),
                Value::Object(obj) => {
                    let mut rendered = Map::new();
                    for (key, val) in obj {
                        let rendered_key = self.expand(key, scopes, options).await;
                        let rendered_val = self.expand_json(val, scopes, options).await;
                        rendered.insert(rendered_key, rendered_val);
                    }
                    Value::Object(rendered)
                }
                _ => value.clone(),
            }
        }
        .boxed()
    }

    fn expand_with_budget<'a>(
        &'a self,
        template: &'a str,
        scopes: &'a ScopeSet,
        options: &'a ExpansionOptions,
        budget: i32,
    ) -> BoxFuture<'a, String> {
        async move {
            if budget < 0 {
                ExpansionMetrics::record_depth_exceeded();
                tracing::warn!(
                    template = %template,
                    "Maximum depth reached while expanding variables, check for recursive variable definitions"
                );
                return template.to_string();
            }

            let matches = scan_placeholders(template);
            if matches.is_empty() {
                return template.to_string();
            }

            // Resolution runs concurrently; FuturesOrdered hands results
            // back in template order, which is the commit order.
            let mut pending: FuturesOrdered<_> = matches
                .iter()
                .map(|m| async move {
                    let value = self.resolve(m, scopes, options, budget).await;
                    (m, value)
                })
                .collect();

            let mut output = String::with_capacity(template.len());
            let mut cursor = 0;
            while let Some((m, value)) = pending.next().await {
                output.push_str(&template[cursor..m.start]);
                output.push_str(&value);
                cursor = m.end;
            }
            output.push_str(&template[cursor..]);

            output
        }
        .boxed()
    }

    async fn resolve(
        &self,
        m: &PlaceholderMatch,
        scopes: &ScopeSet,
        options: &ExpansionOptions,
        budget: i32,
    ) -> String {
        let placeholder = parse_placeholder(&m.body);

        if placeholder.name.is_empty() {
            tracing::warn!(placeholder = %m.body, "Placeholder has no variable name");
            return String::new();
        }

        if options.freeze_vars.contains(&placeholder.name) {
            tracing::trace!(variable = %placeholder.name, "Variable frozen, left unexpanded");
            return format!("${{{}}}", m.body);
        }

        ExpansionMetrics::record_placeholder();

        // Only strings are re-expanded; arrays and objects pass through.
        let raw = match scopes.resolve_raw(&placeholder.name) {
            Value::String(s) => Value::String(
                self.expand_with_budget(&s, scopes, options, budget - 1)
                    .await,
            ),
            other => other,
        };

        let value = self.filters.apply_chain(raw, &placeholder.filters).await;

        let rendered = if options.encode {
            encode_vars(&value)
        } else {
            stringify(&value)
        };

        tracing::trace!(variable = %placeholder.name, value = %rendered, "Placeholder resolved");
        format!("{}{}", rendered, placeholder.arg_suffix)
    }
}

/// Create the shared, Arc-wrapped expander for a host
pub fn create_expander(config: &ExpanderConfig) -> Arc<Expander> {
    let digest: Option<Arc<dyn DigestProvider>> = if config.hash_enabled {
        Some(Arc::new(Sha384Digest))
    } else {
        None
    };
    Arc::new(Expander::new(digest))
}
