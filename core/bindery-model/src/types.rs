use crate::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The declared type of a property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Accepts any value. Used for loosely typed transient properties.
    Any,
    Bool,
    Int,
    Float,
    Text,
    /// An embedded value, referenced entity or reflected bean, by type name.
    Object(String),
    /// A collection with the given element type.
    List(Box<ValueType>),
}

impl ValueType {
    /// Shorthand for `ValueType::Object`.
    pub fn object(type_name: impl Into<String>) -> Self {
        ValueType::Object(type_name.into())
    }

    /// Shorthand for `ValueType::List`.
    pub fn list_of(element: ValueType) -> Self {
        ValueType::List(Box::new(element))
    }

    /// Whether `value` may be stored in a property of this type.
    ///
    /// `Null` fits every type and an `Int` fits a `Float` property.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (ValueType::Any, _) => true,
            (ValueType::Bool, Value::Bool(_)) => true,
            (ValueType::Int, Value::Int(_)) => true,
            (ValueType::Float, Value::Float(_) | Value::Int(_)) => true,
            (ValueType::Text, Value::Text(_)) => true,
            (ValueType::Object(name), Value::Object(o)) => o.borrow().type_name() == name,
            (ValueType::List(element), Value::List(items)) => {
                items.iter().all(|item| element.accepts(item))
            }
            _ => false,
        }
    }

    /// The object type name, if this is an object type.
    pub fn object_type(&self) -> Option<&str> {
        match self {
            ValueType::Object(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, ValueType::List(_))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => f.write_str("any"),
            ValueType::Bool => f.write_str("bool"),
            ValueType::Int => f.write_str("int"),
            ValueType::Float => f.write_str("float"),
            ValueType::Text => f.write_str("text"),
            ValueType::Object(name) => f.write_str(name),
            ValueType::List(element) => write!(f, "list<{element}>"),
        }
    }
}
