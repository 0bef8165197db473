use crate::{ModelError, ModelResult, Object, ObjectRef, Value, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Reads a property from an object.
pub type Getter = Arc<dyn Fn(&Object) -> Value + Send + Sync>;

/// Writes a property on an object. May refuse the value with
/// [`ModelError::Rejected`].
pub type Setter = Arc<dyn Fn(&mut Object, Value) -> ModelResult<()> + Send + Sync>;

/// How a property's value is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    /// Stored directly in the object's field map.
    Field,
    /// Reached through an accessor pair.
    Method,
}

/// The access strategy of a property, carrying the accessors for
/// method access.
#[derive(Clone)]
pub enum AccessStrategy {
    Field,
    Method {
        getter: Getter,
        setter: Option<Setter>,
    },
}

impl AccessStrategy {
    pub fn access_type(&self) -> AccessType {
        match self {
            AccessStrategy::Field => AccessType::Field,
            AccessStrategy::Method { .. } => AccessType::Method,
        }
    }
}

impl fmt::Debug for AccessStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessStrategy::Field => f.write_str("Field"),
            AccessStrategy::Method { setter, .. } => f
                .debug_struct("Method")
                .field("writable", &setter.is_some())
                .finish(),
        }
    }
}

/// Immutable description of one property of a class.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    name: String,
    value_type: ValueType,
    embedded: bool,
    reference: bool,
    collection: bool,
    persistent: bool,
    type_metadata: Option<String>,
    access: AccessStrategy,
}

impl PropertyDescriptor {
    fn new(name: &str, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            collection: value_type.is_collection(),
            value_type,
            embedded: false,
            reference: false,
            persistent: true,
            type_metadata: None,
            access: AccessStrategy::Field,
        }
    }

    /// A persistent scalar property stored in a field.
    pub fn basic(name: &str, value_type: ValueType) -> Self {
        Self::new(name, value_type)
    }

    /// A persistent embedded value whose type has its own metadata.
    pub fn embedded(name: &str, type_name: &str) -> Self {
        Self {
            embedded: true,
            type_metadata: Some(type_name.into()),
            ..Self::new(name, ValueType::object(type_name))
        }
    }

    /// A persistent to-one association with another entity.
    pub fn reference(name: &str, type_name: &str) -> Self {
        Self {
            reference: true,
            type_metadata: Some(type_name.into()),
            ..Self::new(name, ValueType::object(type_name))
        }
    }

    /// A persistent collection-valued property.
    pub fn collection(name: &str, element: ValueType) -> Self {
        Self::new(name, ValueType::list_of(element))
    }

    /// A transient property stored in a field. Usable for display only.
    pub fn transient(name: &str, value_type: ValueType) -> Self {
        Self {
            persistent: false,
            ..Self::new(name, value_type)
        }
    }

    /// A transient, read-only property computed by `getter`.
    pub fn computed(name: &str, value_type: ValueType, getter: Getter) -> Self {
        Self::transient(name, value_type).with_accessors(getter, None)
    }

    /// Switches the property to method access.
    pub fn with_accessors(mut self, getter: Getter, setter: Option<Setter>) -> Self {
        self.access = AccessStrategy::Method { getter, setter };
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    pub fn is_reference(&self) -> bool {
        self.reference
    }

    pub fn is_collection(&self) -> bool {
        self.collection
    }

    /// Persistent properties can be used in query filters.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Name of the nested type's metadata, for embedded and reference properties.
    pub fn type_metadata(&self) -> Option<&str> {
        self.type_metadata.as_deref()
    }

    pub fn access(&self) -> &AccessStrategy {
        &self.access
    }

    pub fn access_type(&self) -> AccessType {
        self.access.access_type()
    }

    pub fn is_writable(&self) -> bool {
        match &self.access {
            AccessStrategy::Field => true,
            AccessStrategy::Method { setter, .. } => setter.is_some(),
        }
    }

    /// Reads the property. Unset fields read as `Null`.
    pub fn get(&self, object: &Object) -> Value {
        match &self.access {
            AccessStrategy::Field => object.field(&self.name).cloned().unwrap_or_default(),
            AccessStrategy::Method { getter, .. } => getter(object),
        }
    }

    /// Type-checks and writes the property.
    pub fn set(&self, object: &mut Object, value: Value) -> ModelResult<()> {
        if !self.value_type.accepts(&value) {
            return Err(ModelError::TypeMismatch {
                property: self.name.clone(),
                expected: self.value_type.clone(),
                found: value.kind(),
            });
        }
        match &self.access {
            AccessStrategy::Field => {
                object.set_field(self.name.clone(), value);
                Ok(())
            }
            AccessStrategy::Method {
                setter: Some(setter),
                ..
            } => setter(object, value),
            AccessStrategy::Method { setter: None, .. } => {
                Err(ModelError::ReadOnly(self.name.clone()))
            }
        }
    }
}

/// Metadata of one entity or embeddable class.
#[derive(Debug, Clone)]
pub struct ClassMetadata {
    name: String,
    properties: Vec<PropertyDescriptor>,
    index: HashMap<String, usize>,
    identifier: Option<String>,
    version: Option<String>,
}

impl ClassMetadata {
    pub fn builder(name: &str) -> ClassMetadataBuilder {
        ClassMetadataBuilder {
            name: name.into(),
            properties: Vec::new(),
            identifier: None,
            version: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.index.get(name).map(|&i| &self.properties[i])
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All properties in declaration order.
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    pub fn persistent_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter().filter(|p| p.is_persistent())
    }

    pub fn transient_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter().filter(|p| !p.is_persistent())
    }

    /// Entity classes have an identifier; embeddables don't.
    pub fn is_entity(&self) -> bool {
        self.identifier.is_some()
    }

    pub fn identifier_property(&self) -> Option<&PropertyDescriptor> {
        self.identifier.as_deref().and_then(|n| self.property(n))
    }

    pub fn version_property(&self) -> Option<&PropertyDescriptor> {
        self.version.as_deref().and_then(|n| self.property(n))
    }

    pub fn get_property_value(&self, object: &ObjectRef, name: &str) -> ModelResult<Value> {
        let property = self.require(name)?;
        Ok(property.get(&object.borrow()))
    }

    pub fn set_property_value(&self, object: &ObjectRef, name: &str, value: Value) -> ModelResult<()> {
        let property = self.require(name)?;
        property.set(&mut object.borrow_mut(), value)
    }

    /// The identifier value of `object`, or `Null` for embeddables.
    pub fn identifier_value(&self, object: &ObjectRef) -> Value {
        self.identifier_property()
            .map(|p| p.get(&object.borrow()))
            .unwrap_or_default()
    }

    fn require(&self, name: &str) -> ModelResult<&PropertyDescriptor> {
        self.property(name).ok_or_else(|| ModelError::UnknownProperty {
            type_name: self.name.clone(),
            property: name.into(),
        })
    }
}

/// Builder for [`ClassMetadata`].
pub struct ClassMetadataBuilder {
    name: String,
    properties: Vec<PropertyDescriptor>,
    identifier: Option<String>,
    version: Option<String>,
}

impl ClassMetadataBuilder {
    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    pub fn identifier(mut self, name: &str) -> Self {
        self.identifier = Some(name.into());
        self
    }

    pub fn version(mut self, name: &str) -> Self {
        self.version = Some(name.into());
        self
    }

    pub fn build(self) -> ModelResult<ClassMetadata> {
        let mut index = HashMap::with_capacity(self.properties.len());
        for (i, property) in self.properties.iter().enumerate() {
            if index.insert(property.name.clone(), i).is_some() {
                return Err(ModelError::DuplicateProperty {
                    type_name: self.name,
                    property: property.name.clone(),
                });
            }
        }
        for name in self.identifier.iter().chain(self.version.iter()) {
            if !index.contains_key(name) {
                return Err(ModelError::MissingProperty {
                    type_name: self.name,
                    property: name.clone(),
                });
            }
        }
        Ok(ClassMetadata {
            name: self.name,
            properties: self.properties,
            index,
            identifier: self.identifier,
            version: self.version,
        })
    }
}
