//! End-to-end expansion tests
//!
//! These tests drive the public engine surface: scopes from JSON documents,
//! the built-in filter set, host-registered async filters and concurrent
//! use of one shared expander.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use ara_macro_expander::config::ExpanderConfig;
use ara_macro_expander::metrics::DEPTH_EXCEEDED_TOTAL;
use ara_macro_expander::template::{
    create_expander, stringify, ExpansionOptions, Expander, Filter, FilterResult, Scope,
    ScopeSet,
};

fn config_scope(vars: Value) -> ScopeSet {
    ScopeSet::new(Scope::empty(), Scope::from_json(&json!({ "vars": vars })))
}

#[tokio::test]
async fn test_scope_precedence() {
    let expander = Expander::default();
    let options = ExpansionOptions::default();
    let trigger = Scope::from_json(&json!({"vars": {"x": "T"}}));
    let config = Scope::from_json(&json!({"vars": {"x": "C"}}));
    let event = Scope::from_json(&json!({"vars": {"x": "E"}}));

    let all = ScopeSet::new(trigger.clone(), config.clone()).with_event(event);
    assert_eq!(expander.expand("${x}", &all, &options).await, "E");

    let no_event = ScopeSet::new(trigger, config.clone());
    assert_eq!(expander.expand("${x}", &no_event, &options).await, "T");

    let config_only = ScopeSet::new(Scope::empty(), config);
    assert_eq!(expander.expand("${x}", &config_only, &options).await, "C");
}

#[tokio::test]
async fn test_filter_chain() {
    let expander = Expander::default();
    let scopes = config_scope(json!({"foo": " hi "}));
    let options = ExpansionOptions::default();

    assert_eq!(
        expander.expand("${foo|trim|toUpperCase}", &scopes, &options).await,
        "HI"
    );
    assert_eq!(
        expander.expand("${foo|toUpperCase|trim}", &scopes, &options).await,
        "HI"
    );
}

#[tokio::test]
async fn test_filter_order_is_observable() {
    let expander = Expander::default();
    let scopes = config_scope(json!({}));
    let options = ExpansionOptions::default();

    let default_then_not = expander.expand("${foo|default:x|not}", &scopes, &options).await;
    let not_then_default = expander.expand("${foo|not|default:x}", &scopes, &options).await;

    assert_eq!(default_then_not, "false");
    assert_eq!(not_then_default, "true");
}

#[tokio::test]
async fn test_unknown_filter_yields_unfiltered_value() {
    let expander = Expander::default();
    let scopes = config_scope(json!({"foo": "a b"}));
    let out = expander
        .expand("${foo|bogus}", &scopes, &ExpansionOptions::default())
        .await;
    assert_eq!(out, "a%20b");
}

#[tokio::test]
async fn test_bad_substr_does_not_poison_siblings() {
    let expander = Expander::default();
    let scopes = config_scope(json!({"a": "abcdef", "b": "xyz"}));
    let out = expander
        .expand("${a|substr:oops}-${b|substr:1}", &scopes, &ExpansionOptions::default())
        .await;
    assert_eq!(out, "abcdef-yz");
}

#[tokio::test]
async fn test_conditional_and_default_filters() {
    let expander = Expander::default();
    let scopes = config_scope(json!({"consent": "yes", "empty": ""}));
    let options = ExpansionOptions::default();

    assert_eq!(
        expander.expand("${consent|if:granted:denied}", &scopes, &options).await,
        "granted"
    );
    assert_eq!(
        expander.expand("${empty|if:granted:denied}", &scopes, &options).await,
        "denied"
    );
    assert_eq!(
        expander.expand("${missing|default:none}", &scopes, &options).await,
        "none"
    );
}

#[tokio::test]
async fn test_json_filter_is_encoded() {
    let expander = Expander::default();
    let scopes = config_scope(json!({"tags": ["a", "b"]}));
    let out = expander
        .expand("${tags|json}", &scopes, &ExpansionOptions::default())
        .await;
    assert_eq!(out, "%5B%22a%22%2C%22b%22%5D");
}

#[tokio::test]
async fn test_depth_budget_halts_without_error() {
    let expander = Expander::default();
    let scopes = config_scope(json!({"1": "1${2}", "2": "2${1}"}));

    for budget in 0..4 {
        let before = DEPTH_EXCEEDED_TOTAL.get();
        let options = ExpansionOptions::default()
            .with_budget(budget)
            .with_encode(false);
        let out = expander.expand("${1}", &scopes, &options).await;
        // budget + 1 substitution layers, then the raw remainder
        let layers: String = (0..=budget)
            .map(|i| if i % 2 == 0 { '1' } else { '2' })
            .collect();
        assert!(out.starts_with(&layers), "budget {}: {}", budget, out);
        assert_eq!(out.len(), layers.len() + "${n}".len());
        assert!(DEPTH_EXCEEDED_TOTAL.get() > before, "budget {}: no depth diagnostic", budget);
    }
}

#[tokio::test]
async fn test_boolean_filters_compose_in_templates() {
    let expander = Expander::default();
    let scopes = config_scope(json!({"x": "v"}));
    let options = ExpansionOptions::default();

    assert_eq!(expander.expand("${x|not|not}", &scopes, &options).await, "true");
    assert_eq!(expander.expand("${x|not|if:yes:no}", &scopes, &options).await, "no");
}

#[tokio::test]
async fn test_oversized_substr_does_not_abort_expansion() {
    let expander = Expander::default();
    let scopes = config_scope(json!({"x": "abcdef"}));
    let out = expander
        .expand("${x|substr:1:1e30}&${x|substr:1e30}", &scopes, &ExpansionOptions::default())
        .await;
    assert_eq!(out, "bcdef&");
}

#[tokio::test]
async fn test_encode_vars_roundtrip() {
    let expander = Expander::default();
    let encoded = expander.encode_vars(&json!(["a b", "c&d"]));
    assert_eq!(encoded, "a%20b,c%26d");

    let decoded: Vec<String> = encoded
        .split(',')
        .map(|s| urlencoding::decode(s).unwrap().into_owned())
        .collect();
    assert_eq!(decoded, vec!["a b", "c&d"]);

    assert_eq!(
        expander.encode_vars(&json!("QUERY_PARAM(foo,bar)")),
        "QUERY_PARAM(foo,bar)"
    );
}

/// Sleeps for `delay` ms, then records the value it saw
struct RecordingFilter {
    seen: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Filter for RecordingFilter {
    async fn apply(&self, value: Value, args: &[String]) -> FilterResult<Value> {
        let delay = args.first().and_then(|d| d.parse().ok()).unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.seen.lock().unwrap().push(stringify(&value));
        Ok(value)
    }
}

#[tokio::test]
async fn test_out_of_order_resolution_commits_in_order() {
    let expander = Expander::default();
    let seen = Arc::new(Mutex::new(Vec::new()));
    expander
        .filters()
        .register("record", Arc::new(RecordingFilter { seen: seen.clone() }))
        .unwrap();

    let scopes = config_scope(json!({"a": "first", "b": "second"}));
    let out = expander
        .expand(
            "${a|record:60}&${b|record:0}",
            &scopes,
            &ExpansionOptions::default(),
        )
        .await;

    assert_eq!(out, "first&second");
    assert_eq!(*seen.lock().unwrap(), vec!["second", "first"]);
}

#[tokio::test]
async fn test_shared_expander_across_tasks() {
    let expander = create_expander(&ExpanderConfig::default());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let expander = expander.clone();
            tokio::spawn(async move {
                let scopes = config_scope(json!({ "n": format!("v {}", i) }));
                expander
                    .expand("n=${n}", &scopes, &ExpansionOptions::default())
                    .await
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap(), format!("n=v%20{}", i));
    }
}

#[tokio::test]
async fn test_hash_filter_disabled() {
    let config = ExpanderConfig {
        hash_enabled: false,
        ..ExpanderConfig::default()
    };
    let expander = create_expander(&config);
    let scopes = config_scope(json!({"email": "a@b.test"}));
    let out = expander
        .expand("h=${email|hash}", &scopes, &ExpansionOptions::default())
        .await;
    assert_eq!(out, "h=");
}

#[tokio::test]
async fn test_scopes_from_document() {
    let expander = Expander::default();
    let scopes = ScopeSet::from_json(&json!({
        "event": {"vars": {"eventId": "click"}},
        "trigger": {"vars": {"label": "${eventId}-btn"}},
        "config": {"vars": {"label": "unused", "base": "https://x.test"}}
    }));
    let options = ExpansionOptions::default().with_encode(false);
    let out = expander.expand("${base}/e?l=${label}", &scopes, &options).await;
    assert_eq!(out, "https://x.test/e?l=click-btn");
}
