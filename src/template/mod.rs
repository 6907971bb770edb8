//! Placeholder expansion engine.
//!
//! This module provides:
//! - Placeholder parsing (`${name(args)|filter:arg|filter}`)
//! - Precedence-ordered variable lookup across event, trigger and config scopes
//! - A registry of named async filters with the built-in set seeded
//! - Bounded recursive expansion with URL encoding of the results
//!
//! # Example
//!
//! ```ignore
//! let expander = create_expander(&ExpanderConfig::default());
//!
//! let scopes = ScopeSet::from_json(&json!({
//!     "config": {"vars": {"title": " Hello World "}}
//! }));
//!
//! let url = expander
//!     .expand("https://x.test/?t=${title|trim|toLowerCase}", &scopes, &ExpansionOptions::default())
//!     .await;
//! assert_eq!(url, "https://x.test/?t=hello%20world");
//! ```

mod digest;
mod encoder;
mod expander;
mod filters;
mod parser;
mod scope;
mod types;

pub use digest::{DigestError, DigestProvider, Sha384Digest};
pub use encoder::{encode_vars, stringify};
pub use expander::{create_expander, ExpansionOptions, Expander, DEFAULT_BUDGET};
pub use filters::{Filter, FilterRegistry, SyncFilter};
pub use parser::{parse_filter_segment, parse_placeholder, parse_variable_reference, scan_placeholders};
pub use scope::{is_truthy, Scope, ScopeSet};
pub use types::{
    FilterArgs, FilterError, FilterInvocation, FilterResult, Placeholder, PlaceholderMatch,
    RegistryError,
};
