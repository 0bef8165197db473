mod common;

use bindery_container::{ContainerError, PropertyList};
use bindery_model::{
    ClassMetadata, MetadataRegistry, Object, ObjectRef, PropertyDescriptor, Value, ValueType,
};
use common::{make_contact, make_person, make_person_without_address, make_registry};
use pretty_assertions::assert_eq;
use std::rc::Rc;

fn make_list() -> PropertyList {
    PropertyList::new(make_registry(), "Person").unwrap()
}

fn names(list: &PropertyList) -> Vec<&str> {
    list.names().map(String::as_str).collect()
}

fn persistent_names(list: &PropertyList) -> Vec<&str> {
    list.persistent_names().map(String::as_str).collect()
}

// ── Construction ────────────────────────────────────────────────

#[test]
fn starts_with_root_properties() {
    let list = make_list();
    assert_eq!(
        names(&list),
        ["address", "age", "contact", "fullName", "id", "manager", "name", "tags"]
    );
    assert_eq!(
        persistent_names(&list),
        ["address", "age", "id", "manager", "name", "tags"]
    );
}

#[test]
fn unknown_root_type_is_rejected() {
    let err = PropertyList::new(make_registry(), "Invoice").unwrap_err();
    assert!(matches!(err, ContainerError::InvalidArgument(_)));
}

// ── Resolution ──────────────────────────────────────────────────

#[test]
fn resolve_is_memoized() {
    let mut list = make_list();
    let a = list.resolve("manager.address.street").unwrap();
    let b = list.resolve("manager.address.street").unwrap();
    assert!(Rc::ptr_eq(&a, &b));
    assert_eq!(a.depth(), 3);
    assert_eq!(a.name(), "manager.address.street");
}

#[test]
fn nested_metadata_steps_stay_persistent() {
    let mut list = make_list();
    let street = list.resolve("address.street").unwrap();
    assert!(street.is_persistent());
    assert!(street.is_writable());
    assert_eq!(street.value_type(), &ValueType::Text);

    let label = list.resolve("address.label").unwrap();
    assert!(!label.is_persistent());
    assert!(!label.is_writable());
}

#[test]
fn transient_parents_resolve_by_reflection() {
    let mut list = make_list();
    let email = list.resolve("contact.email").unwrap();
    assert!(!email.is_persistent());
    assert!(email.is_writable());

    let url = list.resolve("contact.URL").unwrap();
    assert!(!url.is_writable());
    assert_eq!(url.value_type(), &ValueType::Text);
}

#[test]
fn unknown_segments_are_invalid() {
    let mut list = make_list();
    for path in ["nope", "address.nope", "contact.nope", "name.first", "address.", ".zip"] {
        let err = list.resolve(path).unwrap_err();
        assert!(
            matches!(err, ContainerError::InvalidArgument(_)),
            "{path}: {err:?}"
        );
    }
}

// ── Adding and removing ─────────────────────────────────────────

#[test]
fn flat_names_cannot_be_added_as_nested() {
    let mut list = make_list();
    let err = list.add_nested("name").unwrap_err();
    assert_eq!(err.to_string(), "invalid argument: name is not nested");
}

#[test]
fn single_nested_property_keeps_leaf_persistence() {
    let mut list = make_list();
    list.add_nested("address.zip").unwrap();
    list.add_nested("contact.email").unwrap();
    assert!(list.contains("address.zip"));
    assert!(list.is_persistent("address.zip"));
    assert!(list.contains("contact.email"));
    assert!(!list.is_persistent("contact.email"));
}

#[test]
fn wildcard_over_metadata_copies_each_flag() {
    let mut list = make_list();
    list.add_nested("address.*").unwrap();
    assert!(list.is_persistent("address.street"));
    assert!(list.is_persistent("address.zip"));
    assert!(list.contains("address.label"));
    assert!(!list.is_persistent("address.label"));
}

#[test]
fn wildcard_over_bean_adds_getters_as_transient() {
    let mut list = make_list();
    list.add_nested("contact.*").unwrap();
    let added: Vec<&str> = names(&list)
        .into_iter()
        .filter(|n| n.starts_with("contact."))
        .collect();
    assert_eq!(added, ["contact.URL", "contact.email", "contact.phone"]);
    assert!(added.iter().all(|n| !list.is_persistent(n)));
}

#[test]
fn removal_keeps_resolved_paths() {
    let mut list = make_list();
    list.add_nested("address.zip").unwrap();
    let before = list.resolve("address.zip").unwrap();

    assert!(list.remove("address.zip"));
    assert!(!list.remove("address.zip"));
    assert!(!list.contains("address.zip"));
    assert!(!list.is_persistent("address.zip"));

    let after = list.resolve("address.zip").unwrap();
    assert!(Rc::ptr_eq(&before, &after));
}

// ── Values ──────────────────────────────────────────────────────

#[test]
fn reads_and_writes_nested_values() {
    let mut list = make_list();
    list.add_nested("address.street").unwrap();
    let ada = make_person("Ada", 36);

    assert_eq!(
        list.get_value(&ada, "address.street").unwrap(),
        Value::from("Main St")
    );
    list.set_value(&ada, "address.street", "Elm St".into()).unwrap();
    let address = ada.borrow().field("address").cloned().unwrap();
    assert_eq!(
        address.as_object().unwrap().borrow().field("street"),
        Some(&Value::from("Elm St"))
    );
    assert_eq!(list.get_value(&ada, "fullName").unwrap(), Value::from("ADA"));
}

#[test]
fn null_intermediate_reads_null_and_refuses_writes() {
    let mut list = make_list();
    list.add_nested("address.street").unwrap();
    let bob = make_person_without_address("Bob");

    assert_eq!(list.get_value(&bob, "address.street").unwrap(), Value::Null);
    let err = list
        .set_value(&bob, "address.street", "Elm St".into())
        .unwrap_err();
    match err {
        ContainerError::IllegalState(msg) => {
            assert_eq!(msg, "cannot set a property through a null path");
        }
        other => panic!("expected illegal state, got {other:?}"),
    }
}

#[test]
fn reflected_values_go_through_bean_accessors() {
    let mut list = make_list();
    list.add_nested("contact.*").unwrap();
    let ada = make_person("Ada", 36);
    ada.borrow_mut()
        .set_field("contact", make_contact("ada@example.com").into());

    assert_eq!(
        list.get_value(&ada, "contact.URL").unwrap(),
        Value::from("mailto:ada@example.com")
    );
    list.set_value(&ada, "contact.email", "ada@lovelace.org".into())
        .unwrap();
    assert_eq!(
        list.get_value(&ada, "contact.URL").unwrap(),
        Value::from("mailto:ada@lovelace.org")
    );
    assert!(matches!(
        list.set_value(&ada, "contact.URL", "x".into()),
        Err(ContainerError::Model(_))
    ));
}

#[test]
fn values_need_an_available_name() {
    let mut list = make_list();
    list.resolve("address.zip").unwrap();
    let ada = make_person("Ada", 36);
    assert!(matches!(
        list.get_value(&ada, "address.zip"),
        Err(ContainerError::InvalidArgument(_))
    ));
    assert!(matches!(
        list.set_value(&ada, "address.zip", "1".into()),
        Err(ContainerError::InvalidArgument(_))
    ));
}

#[test]
fn type_mismatch_is_a_model_error() {
    let list = make_list();
    let ada = make_person("Ada", 36);
    assert!(matches!(
        list.set_value(&ada, "age", "old".into()),
        Err(ContainerError::Model(_))
    ));
    assert_eq!(list.property_type("age").unwrap(), ValueType::Int);
    assert!(!list.is_writable("fullName").unwrap());
}

// ── Address book scenario ───────────────────────────────────────

#[test]
fn address_wildcard_scenario() {
    let address = ClassMetadata::builder("Address")
        .property(PropertyDescriptor::basic("street", ValueType::Text))
        .property(PropertyDescriptor::basic("zip", ValueType::Text))
        .build()
        .unwrap();
    let person = ClassMetadata::builder("Person")
        .property(PropertyDescriptor::basic("name", ValueType::Text))
        .property(PropertyDescriptor::embedded("address", "Address"))
        .build()
        .unwrap();
    let registry = MetadataRegistry::builder()
        .class(address)
        .class(person)
        .build()
        .unwrap();

    let mut list = PropertyList::new(registry, "Person").unwrap();
    list.add_nested("address.*").unwrap();
    assert_eq!(
        names(&list),
        ["address", "address.street", "address.zip", "name"]
    );
    assert_eq!(names(&list), persistent_names(&list));

    let nobody = ObjectRef::new(Object::new("Person").with("name", "Nobody"));
    assert_eq!(list.get_value(&nobody, "address.street").unwrap(), Value::Null);
}
