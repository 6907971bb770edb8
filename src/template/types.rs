//! Template expansion types and errors

use smallvec::SmallVec;
use thiserror::Error;

/// Error raised by a single filter invocation.
///
/// Filter errors never abort an expansion; the pipeline logs them and
/// skips the failing filter.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Invalid argument for filter {filter}: {message}")]
    InvalidArgument { filter: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;

/// Configuration error raised while registering filters
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Filter already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Filter name must not be empty")]
    EmptyName,
}

/// Literal filter arguments; most filters take at most two
pub type FilterArgs = SmallVec<[String; 2]>;

/// One `name:arg:arg` segment of a filter chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterInvocation {
    pub name: String,
    pub args: FilterArgs,
}

/// A parsed placeholder body: `name(args)|filter:arg|filter`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Variable name looked up in the scopes
    pub name: String,

    /// Verbatim parenthesized suffix, e.g. `(a,b)`, possibly empty
    pub arg_suffix: String,

    /// Filters applied left to right
    pub filters: Vec<FilterInvocation>,
}

/// A `${...}` occurrence found in a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderMatch {
    /// Byte offset of the `$`
    pub start: usize,

    /// Byte offset one past the closing `}`
    pub end: usize,

    /// Text between `${` and `}`
    pub body: String,
}
