//! Accessor tables for non-persistent types.
//!
//! A [`BeanType`] stands in for runtime reflection: it lists the `get*` and
//! `set*` accessor methods of a type that has no persistence metadata, so
//! nested property paths can continue past a transient property.

use crate::{Getter, Object, Setter, Value, ValueType};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Accessors every bean inherits. Never exposed as properties.
pub const OBJECT_METHODS: &[&str] = &["getClass"];

/// One accessor method of a bean type.
#[derive(Clone)]
pub enum BeanMethod {
    Getter { returns: ValueType, call: Getter },
    Setter { accepts: ValueType, call: Setter },
}

impl fmt::Debug for BeanMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BeanMethod::Getter { returns, .. } => write!(f, "Getter -> {returns}"),
            BeanMethod::Setter { accepts, .. } => write!(f, "Setter({accepts})"),
        }
    }
}

/// A reflected type described by its accessor methods.
#[derive(Debug, Clone)]
pub struct BeanType {
    name: String,
    methods: BTreeMap<String, BeanMethod>,
}

impl BeanType {
    pub fn new(name: &str) -> Self {
        let mut methods = BTreeMap::new();
        methods.insert(
            "getClass".to_string(),
            BeanMethod::Getter {
                returns: ValueType::Text,
                call: Arc::new(|o: &Object| Value::Text(o.type_name().to_string())),
            },
        );
        Self {
            name: name.into(),
            methods,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a getter method, e.g. `getStreet`.
    pub fn getter(mut self, method: &str, returns: ValueType, call: Getter) -> Self {
        self.methods
            .insert(method.into(), BeanMethod::Getter { returns, call });
        self
    }

    /// Registers a setter method, e.g. `setStreet`.
    pub fn setter(mut self, method: &str, accepts: ValueType, call: Setter) -> Self {
        self.methods
            .insert(method.into(), BeanMethod::Setter { accepts, call });
        self
    }

    /// Registers a `get`/`set` pair backed by the field `property`.
    pub fn field_property(self, property: &str, value_type: ValueType) -> Self {
        let field = property.to_string();
        let setter_field = field.clone();
        let suffix = capitalize(property);
        self.getter(
            &format!("get{suffix}"),
            value_type.clone(),
            Arc::new(move |o: &Object| o.field(&field).cloned().unwrap_or_default()),
        )
        .setter(
            &format!("set{suffix}"),
            value_type,
            Arc::new(move |o: &mut Object, v: Value| {
                o.set_field(setter_field.clone(), v);
                Ok(())
            }),
        )
    }

    pub fn method(&self, name: &str) -> Option<&BeanMethod> {
        self.methods.get(name)
    }

    /// The `get<Property>` accessor of `property`.
    pub fn find_getter(&self, property: &str) -> Option<(&ValueType, &Getter)> {
        match self.methods.get(&format!("get{}", capitalize(property)))? {
            BeanMethod::Getter { returns, call } => Some((returns, call)),
            BeanMethod::Setter { .. } => None,
        }
    }

    /// The `set<Property>` accessor of `property`, if it accepts `value_type`.
    pub fn find_setter(&self, property: &str, value_type: &ValueType) -> Option<&Setter> {
        match self.methods.get(&format!("set{}", capitalize(property)))? {
            BeanMethod::Setter { accepts, call } if accepts == value_type => Some(call),
            _ => None,
        }
    }

    /// Property names of every `get*` accessor, excluding [`OBJECT_METHODS`].
    pub fn readable_properties(&self) -> Vec<String> {
        self.methods
            .iter()
            .filter(|(name, method)| {
                matches!(method, BeanMethod::Getter { .. })
                    && name.len() > 3
                    && name.starts_with("get")
                    && !OBJECT_METHODS.contains(&name.as_str())
            })
            .map(|(name, _)| decapitalize(&name[3..]))
            .collect()
    }
}

/// `street` → `Street`.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `Street` → `street`, but `URL` stays `URL`.
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    if chars.next().is_some_and(char::is_uppercase) && first.is_uppercase() {
        return name.to_string();
    }
    first.to_lowercase().chain(name.chars().skip(1)).collect()
}
