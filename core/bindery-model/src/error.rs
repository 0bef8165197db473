//! Error types for the model layer.

use crate::ValueType;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building metadata or accessing entity properties.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// A type name that is not registered.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// A property that the type does not declare.
    #[error("unknown property {property} on {type_name}")]
    UnknownProperty { type_name: String, property: String },

    /// The same property name declared twice on one type.
    #[error("duplicate property {property} on {type_name}")]
    DuplicateProperty { type_name: String, property: String },

    /// The identifier or version property is not declared on the type.
    #[error("{type_name} has no property named {property}")]
    MissingProperty { type_name: String, property: String },

    /// A value that does not fit the property's declared type.
    #[error("property {property} expects {expected}, got {found}")]
    TypeMismatch {
        property: String,
        expected: ValueType,
        found: &'static str,
    },

    /// A write to a property without a setter.
    #[error("property {0} is read-only")]
    ReadOnly(String),

    /// A property was read from something that is not an object.
    #[error("cannot read property {property} from a {found} value")]
    NotAnObject {
        property: String,
        found: &'static str,
    },

    /// A domain-level setter refused the value.
    #[error("property {property} rejected the value: {reason}")]
    Rejected { property: String, reason: String },
}
