use bindery_filter::{
    AliasPrefix, Filter, FilterError, JoinType, JunctionKind, Literal, Verbatim,
};
use pretty_assertions::assert_eq;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

fn hash_of(filter: &Filter) -> u64 {
    let mut hasher = DefaultHasher::new();
    filter.hash(&mut hasher);
    hasher.finish()
}

// ── Leaf rendering ───────────────────────────────────────────────

#[test]
fn comparisons_render_with_default_alias() {
    assert_eq!(Filter::eq("name", "Ada").to_ql_string(), "(obj.name = 'Ada')");
    assert_eq!(Filter::lt("age", 30).to_ql_string(), "(obj.age < 30)");
    assert_eq!(Filter::le("age", 30).to_ql_string(), "(obj.age <= 30)");
    assert_eq!(Filter::gt("score", 1.5).to_ql_string(), "(obj.score > 1.5)");
    assert_eq!(Filter::ge("active", true).to_ql_string(), "(obj.active >= true)");
}

#[test]
fn text_literals_escape_quotes() {
    assert_eq!(
        Filter::eq("name", "O'Brien").to_ql_string(),
        "(obj.name = 'O''Brien')"
    );
}

#[test]
fn equality_with_null_renders_is_null() {
    assert_eq!(
        Filter::eq("manager", Literal::Null).to_ql_string(),
        "(obj.manager is null)"
    );
}

#[test]
fn between_inclusive_and_exclusive() {
    assert_eq!(
        Filter::between("age", 18, 65, true).to_ql_string(),
        "(obj.age between 18 and 65)"
    );
    assert_eq!(
        Filter::between("age", 18, 65, false).to_ql_string(),
        "(obj.age > 18 and obj.age < 65)"
    );
}

#[test]
fn like_and_text_match() {
    assert_eq!(
        Filter::like("name", "A%", false).to_ql_string(),
        "(obj.name like 'A%')"
    );
    assert_eq!(
        Filter::text_match("name", "ada", true, true).to_ql_string(),
        "(upper(obj.name) like 'ADA%')"
    );
    assert_eq!(
        Filter::text_match("name", "da", false, false).to_ql_string(),
        "(obj.name like '%da%')"
    );
}

#[test]
fn null_and_empty_checks() {
    assert_eq!(Filter::is_null("a").to_ql_string(), "(obj.a is null)");
    assert_eq!(Filter::is_not_null("a").to_ql_string(), "(obj.a is not null)");
    assert_eq!(Filter::is_empty("tags").to_ql_string(), "(obj.tags is empty)");
    assert_eq!(
        Filter::is_not_empty("tags").to_ql_string(),
        "(obj.tags is not empty)"
    );
}

#[test]
fn custom_preprocessors() {
    let f = Filter::eq("address.zip", "00100");
    assert_eq!(f.to_ql_string_with(&Verbatim), "(address.zip = '00100')");
    assert_eq!(
        f.to_ql_string_with(&AliasPrefix::new("p")),
        "(p.address.zip = '00100')"
    );
    assert_eq!(
        f.to_ql_string_with(&|id: &str| format!("x_{}", id.replace('.', "_"))),
        "(x_address_zip = '00100')"
    );
}

// ── Composites ───────────────────────────────────────────────────

#[test]
fn junctions_join_children_in_order() {
    let f = Filter::and([Filter::eq("a", 1), Filter::eq("b", 2)]).unwrap();
    assert_eq!(f.to_ql_string(), "((obj.a = 1) and (obj.b = 2))");

    let g = Filter::or([Filter::eq("a", 1), Filter::is_null("b")]).unwrap();
    assert_eq!(g.to_ql_string(), "((obj.a = 1) or (obj.b is null))");
}

#[test]
fn empty_junctions_are_rejected() {
    assert_eq!(Filter::and([]), Err(FilterError::Empty("and")));
    assert_eq!(Filter::or([]), Err(FilterError::Empty("or")));
    assert_eq!(
        Filter::join("customer", JoinType::Inner, []),
        Err(FilterError::Empty("join"))
    );
}

#[test]
fn negation_wraps_child() {
    let f = Filter::eq("name", "Ada");
    assert_eq!((!f).to_ql_string(), "(not (obj.name = 'Ada'))");
}

#[test]
fn join_rewrites_every_descendant_property() {
    let f = Filter::join(
        "c",
        JoinType::Left,
        [
            Filter::eq("name", "Ada"),
            Filter::or([Filter::is_null("email"), !Filter::eq("age", 3)]).unwrap(),
        ],
    )
    .unwrap();
    assert_eq!(
        f.to_ql_string(),
        "((c.name = 'Ada') and ((c.email is null) or (not (c.age = 3))))"
    );
}

#[test]
fn join_inside_outer_filters_keeps_outer_alias() {
    let join = Filter::join("c", JoinType::Inner, [Filter::eq("name", "Ada")]).unwrap();
    let f = Filter::and([Filter::eq("id", 1), join]).unwrap();
    assert_eq!(f.to_ql_string(), "((obj.id = 1) and ((c.name = 'Ada')))");
}

#[test]
fn nested_joins_are_rejected() {
    let inner = Filter::join("a", JoinType::Inner, [Filter::eq("x", 1)]).unwrap();
    let wrapped = !Filter::and([inner]).unwrap();
    let err = Filter::join("b", JoinType::Inner, [wrapped]).unwrap_err();
    assert_eq!(
        err,
        FilterError::NestedJoin {
            outer: "b".into(),
            inner: "a".into()
        }
    );
}

// ── Inspection ───────────────────────────────────────────────────

#[test]
fn children_follow_node_kind() {
    let leaf = Filter::eq("a", 1);
    assert!(leaf.children().is_empty());
    let neg = !leaf.clone();
    assert_eq!(neg.children(), std::slice::from_ref(&leaf));
    match Filter::or([leaf.clone(), leaf]).unwrap() {
        Filter::Junction(j) => {
            assert_eq!(j.kind(), JunctionKind::Or);
            assert_eq!(j.filters().len(), 2);
        }
        other => panic!("expected junction, got {other:?}"),
    }
}

#[test]
fn referenced_properties_are_join_qualified() {
    let f = Filter::and([
        Filter::eq("name", "Ada"),
        Filter::join("customer", JoinType::Inner, [Filter::is_null("email")]).unwrap(),
    ])
    .unwrap();
    assert_eq!(f.referenced_properties(), ["name", "customer.email"]);
    assert!(f.contains_join());
    let joins = f.joins();
    assert_eq!(joins.len(), 1);
    assert_eq!(joins[0].property(), "customer");
    assert_eq!(joins[0].join_type(), JoinType::Inner);
}

// ── Equality & serde ─────────────────────────────────────────────

#[test]
fn independently_built_negations_are_equal() {
    let a = !Filter::eq("name", "Ada");
    let b = !Filter::eq("name", "Ada");
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));

    let set: HashSet<Filter> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn different_kinds_are_not_equal() {
    let children = [Filter::eq("a", 1), Filter::eq("b", 2)];
    let and = Filter::and(children.clone()).unwrap();
    let or = Filter::or(children.clone()).unwrap();
    assert_ne!(and, or);

    let reversed = Filter::and(children.into_iter().rev()).unwrap();
    assert_ne!(and, reversed);
}

#[test]
fn float_literals_compare_by_bits() {
    assert_eq!(Filter::eq("x", f64::NAN), Filter::eq("x", f64::NAN));
    assert_ne!(Filter::eq("x", 0.0), Filter::eq("x", -0.0));
}

#[test]
fn filters_survive_json() {
    let f = Filter::join("c", JoinType::Left, [!Filter::like("name", "A%", true)]).unwrap();
    let json = serde_json::to_string(&f).unwrap();
    let back: Filter = serde_json::from_str(&json).unwrap();
    assert_eq!(back, f);
}

#[test]
fn deserializing_nested_join_fails() {
    let inner = Filter::join("a", JoinType::Inner, [Filter::eq("x", 1)]).unwrap();
    let json = format!(
        r#"{{"join":{{"property":"b","join_type":"inner","filters":[{}]}}}}"#,
        serde_json::to_string(&inner).unwrap()
    );
    assert!(serde_json::from_str::<Filter>(&json).is_err());
}
