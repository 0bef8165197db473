//! Filter expressions for entity containers.
//!
//! A [`Filter`] is an immutable tree of comparisons, junctions, negations and
//! joins. Rendering walks the tree with a [`PropertyIdPreprocessor`] that turns
//! property ids into query-language paths; a join swaps the preprocessor for
//! all of its descendants so every leaf reads `<joinProperty>.<property>`.
//!
//! ```text
//! Filter::and([eq("name", "Ada"), !is_null("address")])
//!   → ((obj.name = 'Ada') and (not (obj.address is null)))
//! ```

mod error;
mod filter;
mod literal;
mod preprocessor;

pub use error::{FilterError, FilterResult};
pub use filter::{Comparison, Filter, Join, JoinType, Junction, JunctionKind, Negation, Operator};
pub use literal::Literal;
pub use preprocessor::{AliasPrefix, DEFAULT_ALIAS, PropertyIdPreprocessor, Verbatim};
