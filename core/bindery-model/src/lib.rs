//! Entity model for Bindery.
//!
//! Defines the types every container and filter builds on:
//! - [`Value`] / [`ObjectRef`]: dynamic entity values with reference semantics
//! - [`ValueType`]: the declared type of a property
//! - [`PropertyDescriptor`] / [`ClassMetadata`]: immutable per-type property metadata
//! - [`BeanType`]: accessor tables for non-persistent (reflected) types
//! - [`MetadataRegistry`]: the read-only registry injected into containers
//!
//! Metadata is built once, validated by [`MetadataRegistryBuilder::build`],
//! and shared read-only (`Arc`) by every container of the types it describes.

mod bean;
mod error;
mod metadata;
mod registry;
mod types;
mod value;

pub use bean::{BeanMethod, BeanType, OBJECT_METHODS, capitalize, decapitalize};
pub use error::{ModelError, ModelResult};
pub use metadata::{
    AccessStrategy, AccessType, ClassMetadata, ClassMetadataBuilder, Getter, PropertyDescriptor,
    Setter,
};
pub use registry::{MetadataRegistry, MetadataRegistryBuilder};
pub use types::ValueType;
pub use value::{Object, ObjectRef, Value};
