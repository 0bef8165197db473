use thiserror::Error;

/// Result type for filter construction.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors raised while building a filter tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// A join filter somewhere below another join filter.
    #[error("join on {inner} cannot be nested inside join on {outer}")]
    NestedJoin { outer: String, inner: String },

    /// A junction or join without children.
    #[error("{0} filter needs at least one child")]
    Empty(&'static str),
}
