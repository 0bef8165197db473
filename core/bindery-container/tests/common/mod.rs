#![allow(dead_code)]

use bindery_container::{ContainerConfig, EntityContainer, EntityProvider, InMemoryEntityProvider};
use bindery_model::{
    BeanType, ClassMetadata, MetadataRegistry, ModelError, Object, ObjectRef, PropertyDescriptor,
    Value, ValueType,
};
use std::rc::Rc;
use std::sync::Arc;

/// Person { id, name, age, address: Address, manager: Person, tags,
/// fullName (computed), contact: ContactCard (transient bean) }
pub fn make_registry() -> Arc<MetadataRegistry> {
    let address = ClassMetadata::builder("Address")
        .property(PropertyDescriptor::basic("street", ValueType::Text))
        .property(PropertyDescriptor::basic("zip", ValueType::Text))
        .property(PropertyDescriptor::computed(
            "label",
            ValueType::Text,
            Arc::new(|o: &Object| {
                let street = o.field("street").and_then(Value::as_str).unwrap_or("");
                let zip = o.field("zip").and_then(Value::as_str).unwrap_or("");
                Value::Text(format!("{street}, {zip}"))
            }),
        ))
        .build()
        .unwrap();

    let person = ClassMetadata::builder("Person")
        .property(PropertyDescriptor::basic("id", ValueType::Int))
        .property(PropertyDescriptor::basic("name", ValueType::Text))
        .property(PropertyDescriptor::basic("age", ValueType::Int))
        .property(PropertyDescriptor::embedded("address", "Address"))
        .property(PropertyDescriptor::reference("manager", "Person"))
        .property(PropertyDescriptor::collection("tags", ValueType::Text))
        .property(PropertyDescriptor::computed(
            "fullName",
            ValueType::Text,
            Arc::new(|o: &Object| {
                let name = o.field("name").and_then(Value::as_str).unwrap_or("");
                Value::Text(name.to_uppercase())
            }),
        ))
        .property(PropertyDescriptor::transient(
            "contact",
            ValueType::object("ContactCard"),
        ))
        .identifier("id")
        .build()
        .unwrap();

    let contact = BeanType::new("ContactCard")
        .field_property("email", ValueType::Text)
        .getter(
            "getURL",
            ValueType::Text,
            Arc::new(|o: &Object| {
                let email = o.field("email").and_then(Value::as_str).unwrap_or("");
                Value::Text(format!("mailto:{email}"))
            }),
        )
        .getter(
            "getPhone",
            ValueType::Text,
            Arc::new(|o: &Object| o.field("phone").cloned().unwrap_or_default()),
        )
        .setter(
            "setPhone",
            ValueType::Text,
            Arc::new(|o: &mut Object, v: Value| {
                let digits = v.as_str().is_none_or(|s| s.chars().all(|c| c.is_ascii_digit()));
                if !digits {
                    return Err(ModelError::Rejected {
                        property: "phone".into(),
                        reason: "digits only".into(),
                    });
                }
                o.set_field("phone", v);
                Ok(())
            }),
        );

    MetadataRegistry::builder()
        .class(address)
        .class(person)
        .bean(contact)
        .build()
        .unwrap()
}

pub fn make_address(street: &str, zip: &str) -> ObjectRef {
    ObjectRef::new(Object::new("Address").with("street", street).with("zip", zip))
}

pub fn make_person(name: &str, age: i64) -> ObjectRef {
    ObjectRef::new(
        Object::new("Person")
            .with("name", name)
            .with("age", age)
            .with("address", make_address("Main St", "00100"))
            .with("tags", Vec::<Value>::new()),
    )
}

pub fn make_person_without_address(name: &str) -> ObjectRef {
    ObjectRef::new(Object::new("Person").with("name", name).with("age", 40))
}

pub fn make_contact(email: &str) -> ObjectRef {
    ObjectRef::new(Object::new("ContactCard").with("email", email))
}

pub fn make_provider(registry: &Arc<MetadataRegistry>) -> Rc<InMemoryEntityProvider> {
    let metadata = Arc::clone(registry.class("Person").unwrap());
    Rc::new(InMemoryEntityProvider::new(metadata))
}

pub fn make_container(config: ContainerConfig) -> (EntityContainer, Rc<InMemoryEntityProvider>) {
    init_tracing();
    let registry = make_registry();
    let provider = make_provider(&registry);
    let dynamic: Rc<dyn EntityProvider> = provider.clone();
    let container = EntityContainer::new(registry, "Person", dynamic, config).unwrap();
    (container, provider)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
