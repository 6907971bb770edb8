//! Placeholder parsing
//!
//! A placeholder body has the shape `name(args)|filter:arg:arg|filter`.
//! There is no escaping: `:` and `|` cannot appear inside names or arguments.

use lazy_static::lazy_static;
use regex::Regex;

use super::types::{FilterArgs, FilterInvocation, Placeholder, PlaceholderMatch};

lazy_static! {
    static ref PLACEHOLDER_RE: Regex =
        Regex::new(r"\$\{([^}]*)\}").expect("placeholder pattern is valid");
}

/// Find every non-overlapping `${...}` occurrence in `template`
pub fn scan_placeholders(template: &str) -> Vec<PlaceholderMatch> {
    PLACEHOLDER_RE
        .captures_iter(template)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let body = caps.get(1)?;
            Some(PlaceholderMatch {
                start: whole.start(),
                end: whole.end(),
                body: body.as_str().to_string(),
            })
        })
        .collect()
}

/// Split a variable reference on the first `(` into a bare name and the
/// verbatim parenthesized suffix. A missing suffix yields an empty string.
pub fn parse_variable_reference(key: &str) -> (String, String) {
    match key.find('(') {
        Some(idx) => (key[..idx].to_string(), key[idx..].to_string()),
        None => (key.to_string(), String::new()),
    }
}

/// Split a filter segment on `:` into a filter name and literal arguments.
///
/// Returns `None` when the filter name is empty.
pub fn parse_filter_segment(segment: &str) -> Option<FilterInvocation> {
    let mut tokens = segment.split(':');
    let name = tokens.next().unwrap_or_default().trim();

    if name.is_empty() {
        tracing::warn!(segment = %segment, "Filter name is empty, ignoring filter");
        return None;
    }

    let args: FilterArgs = tokens.map(|t| t.trim().to_string()).collect();

    Some(FilterInvocation {
        name: name.to_string(),
        args,
    })
}

/// Parse a full placeholder body into its name, suffix and filter chain
pub fn parse_placeholder(body: &str) -> Placeholder {
    let mut segments = body.split('|');
    let reference = segments.next().unwrap_or_default();
    let (name, arg_suffix) = parse_variable_reference(reference.trim());

    let filters = segments.filter_map(parse_filter_segment).collect();

    Placeholder {
        name,
        arg_suffix,
        filters,
    }
}
