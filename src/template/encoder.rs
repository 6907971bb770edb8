//! URL encoding of resolved values

use serde_json::Value;

use super::parser::parse_variable_reference;
use super::scope::is_truthy;

/// String form of a value as seen by string filters and the encoder.
///
/// Arrays join their elements with `,`; objects render as JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Percent-encode a resolved value for inclusion in a URL.
///
/// Falsy values encode to "". Arrays encode element-wise and join with `,`.
/// A trailing parenthesized suffix (as in `QUERY_PARAM(foo,bar)`) is kept
/// verbatim; only the name in front of it is encoded.
pub fn encode_vars(raw: &Value) -> String {
    if !is_truthy(raw) {
        return String::new();
    }

    if let Value::Array(items) = raw {
        return items
            .iter()
            .map(|item| urlencoding::encode(&stringify(item)).into_owned())
            .collect::<Vec<_>>()
            .join(",");
    }

    let (name, suffix) = parse_variable_reference(&stringify(raw));
    format!("{}{}", urlencoding::encode(&name), suffix)
}
