use crate::literal::quote;
use crate::preprocessor::JoinPrefix;
use crate::{AliasPrefix, FilterError, FilterResult, Literal, PropertyIdPreprocessor};
use serde::{Deserialize, Serialize};
use std::ops::Not;

/// A node of a filter expression tree.
///
/// Equality and hashing are structural: two filters are equal when they are
/// the same kind of node with equal operands and equal children in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    Comparison(Comparison),
    Junction(Junction),
    Negation(Negation),
    Join(Join),
}

/// A leaf comparing one property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Comparison {
    property: String,
    op: Operator,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq(Literal),
    Lt(Literal),
    Le(Literal),
    Gt(Literal),
    Ge(Literal),
    Between {
        low: Literal,
        high: Literal,
        inclusive: bool,
    },
    /// `pattern` uses `%` and `_` wildcards.
    Like {
        pattern: String,
        ignore_case: bool,
    },
    IsNull,
    IsNotNull,
    /// Collection-valued property has no elements.
    IsEmpty,
    IsNotEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JunctionKind {
    And,
    Or,
}

impl JunctionKind {
    fn keyword(self) -> &'static str {
        match self {
            JunctionKind::And => "and",
            JunctionKind::Or => "or",
        }
    }
}

/// A conjunction or disjunction of child filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "JunctionRepr")]
pub struct Junction {
    kind: JunctionKind,
    filters: Vec<Filter>,
}

#[derive(Deserialize)]
struct JunctionRepr {
    kind: JunctionKind,
    filters: Vec<Filter>,
}

impl TryFrom<JunctionRepr> for Junction {
    type Error = FilterError;

    fn try_from(repr: JunctionRepr) -> FilterResult<Self> {
        Junction::new(repr.kind, repr.filters)
    }
}

impl Junction {
    fn new(kind: JunctionKind, filters: Vec<Filter>) -> FilterResult<Self> {
        if filters.is_empty() {
            return Err(FilterError::Empty(kind.keyword()));
        }
        Ok(Self { kind, filters })
    }

    pub fn kind(&self) -> JunctionKind {
        self.kind
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }
}

/// Logical negation of exactly one child.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Negation {
    filter: Box<Filter>,
}

impl Negation {
    pub fn filter(&self) -> &Filter {
        &self.filter
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinType {
    Inner,
    Left,
}

/// A conjunction evaluated against a joined association.
///
/// Every property referenced below a join is rendered as
/// `<property>.<leaf property>`; joins cannot contain other joins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "JoinRepr")]
pub struct Join {
    property: String,
    join_type: JoinType,
    filters: Vec<Filter>,
}

#[derive(Deserialize)]
struct JoinRepr {
    property: String,
    join_type: JoinType,
    filters: Vec<Filter>,
}

impl TryFrom<JoinRepr> for Join {
    type Error = FilterError;

    fn try_from(repr: JoinRepr) -> FilterResult<Self> {
        Join::new(repr.property, repr.join_type, repr.filters)
    }
}

impl Join {
    fn new(property: String, join_type: JoinType, filters: Vec<Filter>) -> FilterResult<Self> {
        if filters.is_empty() {
            return Err(FilterError::Empty("join"));
        }
        if let Some(inner) = filters.iter().find_map(Filter::first_join) {
            return Err(FilterError::NestedJoin {
                outer: property,
                inner: inner.property.clone(),
            });
        }
        Ok(Self {
            property,
            join_type,
            filters,
        })
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }
}

// ── Construction ─────────────────────────────────────────────────

impl Filter {
    fn compare(property: impl Into<String>, op: Operator) -> Filter {
        Filter::Comparison(Comparison {
            property: property.into(),
            op,
        })
    }

    pub fn eq(property: impl Into<String>, value: impl Into<Literal>) -> Filter {
        Self::compare(property, Operator::Eq(value.into()))
    }

    pub fn lt(property: impl Into<String>, value: impl Into<Literal>) -> Filter {
        Self::compare(property, Operator::Lt(value.into()))
    }

    pub fn le(property: impl Into<String>, value: impl Into<Literal>) -> Filter {
        Self::compare(property, Operator::Le(value.into()))
    }

    pub fn gt(property: impl Into<String>, value: impl Into<Literal>) -> Filter {
        Self::compare(property, Operator::Gt(value.into()))
    }

    pub fn ge(property: impl Into<String>, value: impl Into<Literal>) -> Filter {
        Self::compare(property, Operator::Ge(value.into()))
    }

    pub fn between(
        property: impl Into<String>,
        low: impl Into<Literal>,
        high: impl Into<Literal>,
        inclusive: bool,
    ) -> Filter {
        Self::compare(
            property,
            Operator::Between {
                low: low.into(),
                high: high.into(),
                inclusive,
            },
        )
    }

    pub fn like(property: impl Into<String>, pattern: impl Into<String>, ignore_case: bool) -> Filter {
        Self::compare(
            property,
            Operator::Like {
                pattern: pattern.into(),
                ignore_case,
            },
        )
    }

    /// Matches `text` anywhere in the property, or only at its start.
    pub fn text_match(
        property: impl Into<String>,
        text: &str,
        ignore_case: bool,
        only_match_prefix: bool,
    ) -> Filter {
        let pattern = if only_match_prefix {
            format!("{text}%")
        } else {
            format!("%{text}%")
        };
        Self::like(property, pattern, ignore_case)
    }

    pub fn is_null(property: impl Into<String>) -> Filter {
        Self::compare(property, Operator::IsNull)
    }

    pub fn is_not_null(property: impl Into<String>) -> Filter {
        Self::compare(property, Operator::IsNotNull)
    }

    pub fn is_empty(property: impl Into<String>) -> Filter {
        Self::compare(property, Operator::IsEmpty)
    }

    pub fn is_not_empty(property: impl Into<String>) -> Filter {
        Self::compare(property, Operator::IsNotEmpty)
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> FilterResult<Filter> {
        Junction::new(JunctionKind::And, filters.into_iter().collect()).map(Filter::Junction)
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> FilterResult<Filter> {
        Junction::new(JunctionKind::Or, filters.into_iter().collect()).map(Filter::Junction)
    }

    pub fn negate(filter: Filter) -> Filter {
        Filter::Negation(Negation {
            filter: Box::new(filter),
        })
    }

    /// Fails with [`FilterError::NestedJoin`] if any child contains a join.
    pub fn join(
        property: impl Into<String>,
        join_type: JoinType,
        filters: impl IntoIterator<Item = Filter>,
    ) -> FilterResult<Filter> {
        Join::new(property.into(), join_type, filters.into_iter().collect()).map(Filter::Join)
    }
}

impl Not for Filter {
    type Output = Filter;

    fn not(self) -> Filter {
        Filter::negate(self)
    }
}

// ── Inspection ───────────────────────────────────────────────────

impl Filter {
    /// Direct children, in order. Leaves have none.
    pub fn children(&self) -> &[Filter] {
        match self {
            Filter::Comparison(_) => &[],
            Filter::Junction(j) => &j.filters,
            Filter::Negation(n) => std::slice::from_ref(n.filter.as_ref()),
            Filter::Join(j) => &j.filters,
        }
    }

    pub fn is_join(&self) -> bool {
        matches!(self, Filter::Join(_))
    }

    pub fn contains_join(&self) -> bool {
        self.first_join().is_some()
    }

    fn first_join(&self) -> Option<&Join> {
        match self {
            Filter::Join(j) => Some(j),
            other => other.children().iter().find_map(Filter::first_join),
        }
    }

    /// Every join in the tree, so the query layer can declare them.
    pub fn joins(&self) -> Vec<&Join> {
        let mut joins = Vec::new();
        self.collect_joins(&mut joins);
        joins
    }

    fn collect_joins<'a>(&'a self, joins: &mut Vec<&'a Join>) {
        if let Filter::Join(j) = self {
            joins.push(j);
        }
        for child in self.children() {
            child.collect_joins(joins);
        }
    }

    /// Property ids referenced by the leaves. Properties under a join are
    /// qualified with the join property.
    pub fn referenced_properties(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_properties(None, &mut out);
        out
    }

    fn collect_properties(&self, join: Option<&str>, out: &mut Vec<String>) {
        match self {
            Filter::Comparison(c) => out.push(match join {
                Some(prefix) => format!("{prefix}.{}", c.property),
                None => c.property.clone(),
            }),
            Filter::Join(j) => {
                for child in &j.filters {
                    child.collect_properties(Some(&j.property), out);
                }
            }
            other => {
                for child in other.children() {
                    child.collect_properties(join, out);
                }
            }
        }
    }
}

impl Comparison {
    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn op(&self) -> &Operator {
        &self.op
    }

    fn write_ql(&self, out: &mut String, preprocessor: &dyn PropertyIdPreprocessor) {
        let p = preprocessor.process(&self.property);
        let rendered = match &self.op {
            Operator::Eq(v) if v.is_null() => format!("({p} is null)"),
            Operator::Eq(v) => format!("({p} = {})", v.to_ql()),
            Operator::Lt(v) => format!("({p} < {})", v.to_ql()),
            Operator::Le(v) => format!("({p} <= {})", v.to_ql()),
            Operator::Gt(v) => format!("({p} > {})", v.to_ql()),
            Operator::Ge(v) => format!("({p} >= {})", v.to_ql()),
            Operator::Between {
                low,
                high,
                inclusive: true,
            } => format!("({p} between {} and {})", low.to_ql(), high.to_ql()),
            Operator::Between { low, high, .. } => {
                format!("({p} > {} and {p} < {})", low.to_ql(), high.to_ql())
            }
            Operator::Like {
                pattern,
                ignore_case: true,
            } => format!("(upper({p}) like {})", quote(&pattern.to_uppercase())),
            Operator::Like { pattern, .. } => format!("({p} like {})", quote(pattern)),
            Operator::IsNull => format!("({p} is null)"),
            Operator::IsNotNull => format!("({p} is not null)"),
            Operator::IsEmpty => format!("({p} is empty)"),
            Operator::IsNotEmpty => format!("({p} is not empty)"),
        };
        out.push_str(&rendered);
    }
}

// ── Rendering ────────────────────────────────────────────────────

impl Filter {
    /// Renders with the default `obj.` alias.
    pub fn to_ql_string(&self) -> String {
        self.to_ql_string_with(&AliasPrefix::default())
    }

    pub fn to_ql_string_with(&self, preprocessor: &dyn PropertyIdPreprocessor) -> String {
        let mut out = String::new();
        self.write_ql(&mut out, preprocessor);
        out
    }

    fn write_ql(&self, out: &mut String, preprocessor: &dyn PropertyIdPreprocessor) {
        match self {
            Filter::Comparison(c) => c.write_ql(out, preprocessor),
            Filter::Junction(j) => write_junction(out, j.kind.keyword(), &j.filters, preprocessor),
            Filter::Negation(n) => {
                out.push_str("(not ");
                n.filter.write_ql(out, preprocessor);
                out.push(')');
            }
            Filter::Join(j) => write_junction(out, "and", &j.filters, &JoinPrefix(&j.property)),
        }
    }
}

fn write_junction(
    out: &mut String,
    keyword: &str,
    filters: &[Filter],
    preprocessor: &dyn PropertyIdPreprocessor,
) {
    out.push('(');
    for (i, filter) in filters.iter().enumerate() {
        if i > 0 {
            out.push(' ');
            out.push_str(keyword);
            out.push(' ');
        }
        filter.write_ql(out, preprocessor);
    }
    out.push(')');
}
