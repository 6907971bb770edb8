//! Filter registry, built-in filters and the filter pipeline

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;

use super::digest::DigestProvider;
use super::encoder::stringify;
use super::scope::is_truthy;
use super::types::{FilterError, FilterInvocation, FilterResult, RegistryError};
use crate::metrics::FilterMetrics;

/// A named transform applied to a resolved value.
///
/// Arguments are always literal text taken from the placeholder.
#[async_trait]
pub trait Filter: Send + Sync {
    async fn apply(&self, value: Value, args: &[String]) -> FilterResult<Value>;
}

/// Adapter turning a plain function into a [`Filter`]
pub struct SyncFilter<F> {
    func: F,
}

impl<F> SyncFilter<F> {
    pub fn new(func: F) -> Self
    where
        F: Fn(Value, &[String]) -> FilterResult<Value> + Send + Sync + 'static,
    {
        Self { func }
    }
}

#[async_trait]
impl<F> Filter for SyncFilter<F>
where
    F: Fn(Value, &[String]) -> FilterResult<Value> + Send + Sync + 'static,
{
    async fn apply(&self, value: Value, args: &[String]) -> FilterResult<Value> {
        (self.func)(value, args)
    }
}

/// `hash`: delegates to the digest facility.
///
/// An unavailable or failing digest yields "" rather than an error, so the
/// unhashed value never leaks into the output.
struct HashFilter {
    digest: Option<Arc<dyn DigestProvider>>,
}

#[async_trait]
impl Filter for HashFilter {
    async fn apply(&self, value: Value, _args: &[String]) -> FilterResult<Value> {
        let Some(provider) = self.digest.as_ref() else {
            FilterMetrics::record_failure("hash");
            tracing::warn!("Digest facility unavailable, hash resolves to empty string");
            return Ok(Value::String(String::new()));
        };

        match provider.digest(&stringify(&value)).await {
            Ok(digest) => Ok(Value::String(digest)),
            Err(e) => {
                FilterMetrics::record_failure("hash");
                tracing::warn!(error = %e, "Digest failed, hash resolves to empty string");
                Ok(Value::String(String::new()))
            }
        }
    }
}

/// Registry of named filters.
///
/// Seeded with the built-in filters at construction; hosts may register
/// more, but a name can only be registered once.
pub struct FilterRegistry {
    filters: DashMap<String, Arc<dyn Filter>>,
}

impl FilterRegistry {
    /// Create a registry seeded with the built-in filters
    pub fn new(digest: Option<Arc<dyn DigestProvider>>) -> Self {
        let registry = Self::empty();

        registry.seed("default", SyncFilter::new(default_filter));
        registry.seed("substr", SyncFilter::new(substr_filter));
        registry.seed(
            "trim",
            SyncFilter::new(|v, _| Ok(Value::String(stringify(&v).trim().to_string()))),
        );
        registry.seed("json", SyncFilter::new(json_filter));
        registry.seed(
            "toLowerCase",
            SyncFilter::new(|v, _| Ok(Value::String(stringify(&v).to_lowercase()))),
        );
        registry.seed(
            "toUpperCase",
            SyncFilter::new(|v, _| Ok(Value::String(stringify(&v).to_uppercase()))),
        );
        registry.seed(
            "not",
            SyncFilter::new(|v, _| Ok(Value::String((!filter_truthy(&v)).to_string()))),
        );
        registry.seed(
            "base64",
            SyncFilter::new(|v, _| Ok(Value::String(URL_SAFE_NO_PAD.encode(stringify(&v))))),
        );
        registry.seed("hash", HashFilter { digest });
        registry.seed("if", SyncFilter::new(if_filter));

        registry
    }

    /// Create a registry with no filters
    pub fn empty() -> Self {
        Self {
            filters: DashMap::new(),
        }
    }

    fn seed(&self, name: &str, filter: impl Filter + 'static) {
        self.filters.insert(name.to_string(), Arc::new(filter));
    }

    /// Register a filter under `name`
    pub fn register(&self, name: &str, filter: Arc<dyn Filter>) -> Result<(), RegistryError> {
        if name.is_empty() {
            tracing::error!("Attempted to register a filter with an empty name");
            return Err(RegistryError::EmptyName);
        }

        match self.filters.entry(name.to_string()) {
            Entry::Occupied(_) => {
                tracing::error!(filter = %name, "Filter registered twice");
                Err(RegistryError::AlreadyRegistered(name.to_string()))
            }
            Entry::Vacant(slot) => {
                slot.insert(filter);
                tracing::debug!(filter = %name, "Filter registered");
                Ok(())
            }
        }
    }

    /// Register a synchronous function as a filter
    pub fn register_sync<F>(&self, name: &str, func: F) -> Result<(), RegistryError>
    where
        F: Fn(Value, &[String]) -> FilterResult<Value> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(SyncFilter::new(func)))
    }

    /// Look up a filter by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Filter>> {
        self.filters.get(name).map(|f| Arc::clone(f.value()))
    }

    /// Check if a filter exists
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Number of registered filters
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Thread `value` through `chain`, left to right.
    ///
    /// Unknown filters and failing filters are logged and skipped; the value
    /// they received is passed on unchanged.
    pub async fn apply_chain(&self, mut value: Value, chain: &[FilterInvocation]) -> Value {
        for invocation in chain {
            let Some(filter) = self.get(&invocation.name) else {
                FilterMetrics::record_failure("unknown");
                tracing::warn!(filter = %invocation.name, "Unknown filter, skipping");
                continue;
            };

            match filter.apply(value.clone(), &invocation.args).await {
                Ok(next) => value = next,
                Err(e) => {
                    FilterMetrics::record_failure(&invocation.name);
                    tracing::warn!(filter = %invocation.name, error = %e, "Filter failed, skipping");
                }
            }
        }
        value
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Truthiness for the boolean filters.
///
/// Strings produced by earlier filters (`not` yields "true"/"false") are
/// read back as booleans, so `not|not` and `not|if` compose.
fn filter_truthy(value: &Value) -> bool {
    match value {
        Value::String(s) => !matches!(
            s.as_str(),
            "" | "false" | "0" | "null" | "NaN" | "undefined"
        ),
        other => is_truthy(other),
    }
}

fn default_filter(value: Value, args: &[String]) -> FilterResult<Value> {
    if filter_truthy(&value) {
        Ok(value)
    } else {
        Ok(Value::String(args.first().cloned().unwrap_or_default()))
    }
}

fn if_filter(value: Value, args: &[String]) -> FilterResult<Value> {
    let idx = if filter_truthy(&value) { 0 } else { 1 };
    Ok(Value::String(args.get(idx).cloned().unwrap_or_default()))
}

fn json_filter(value: Value, _args: &[String]) -> FilterResult<Value> {
    Ok(Value::String(serde_json::to_string(&value)?))
}

fn numeric_arg(arg: Option<&String>, what: &str) -> FilterResult<f64> {
    arg.and_then(|a| a.parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .ok_or_else(|| FilterError::InvalidArgument {
            filter: "substr".to_string(),
            message: format!("{} must be a number, got {:?}", what, arg),
        })
}

/// `substr:start[:length]` with JS `substr` semantics: a negative start
/// counts from the end, a missing or empty length runs to the end.
fn substr_filter(value: Value, args: &[String]) -> FilterResult<Value> {
    let chars: Vec<char> = stringify(&value).chars().collect();
    let len = chars.len() as i64;

    let start = numeric_arg(args.first(), "start")?.trunc() as i64;
    let length = match args.get(1).filter(|l| !l.is_empty()) {
        Some(l) => numeric_arg(Some(l), "length")?.trunc() as i64,
        None => len,
    };

    let start = if start < 0 { (len + start).max(0) } else { start.min(len) };
    let end = start.saturating_add(length.max(0)).min(len);

    Ok(Value::String(chars[start as usize..end as usize].iter().collect()))
}
