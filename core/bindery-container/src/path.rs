//! Resolved property paths.
//!
//! A [`PropertyPath`] is the chain of accessors for a name such as
//! `address.street`: one step per segment. Steps backed by class metadata
//! are [`MetadataAccessor`]s; steps found on reflected bean types are
//! [`ReflectedAccessor`]s.

use crate::{ContainerError, ContainerResult};
use bindery_model::{
    ClassMetadata, Getter, ModelError, ModelResult, ObjectRef, PropertyDescriptor, Setter, Value,
    ValueType,
};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// One step of a property path.
pub trait PropertyAccessor {
    fn name(&self) -> &str;

    fn value_type(&self) -> &ValueType;

    /// Metadata of the value this step returns, when it is a persistent
    /// embedded or reference type.
    fn nested_metadata(&self) -> Option<&Arc<ClassMetadata>>;

    fn is_persistent(&self) -> bool;

    fn is_writable(&self) -> bool;

    fn get(&self, target: &ObjectRef) -> Value;

    fn set(&self, target: &ObjectRef, value: Value) -> ModelResult<()>;
}

/// A step described by a [`PropertyDescriptor`].
#[derive(Debug, Clone)]
pub struct MetadataAccessor {
    property: PropertyDescriptor,
    nested: Option<Arc<ClassMetadata>>,
}

impl MetadataAccessor {
    pub fn new(property: PropertyDescriptor, nested: Option<Arc<ClassMetadata>>) -> Self {
        Self { property, nested }
    }

    pub fn descriptor(&self) -> &PropertyDescriptor {
        &self.property
    }
}

impl PropertyAccessor for MetadataAccessor {
    fn name(&self) -> &str {
        self.property.name()
    }

    fn value_type(&self) -> &ValueType {
        self.property.value_type()
    }

    fn nested_metadata(&self) -> Option<&Arc<ClassMetadata>> {
        self.nested.as_ref()
    }

    fn is_persistent(&self) -> bool {
        self.property.is_persistent()
    }

    fn is_writable(&self) -> bool {
        self.property.is_writable()
    }

    fn get(&self, target: &ObjectRef) -> Value {
        self.property.get(&target.borrow())
    }

    fn set(&self, target: &ObjectRef, value: Value) -> ModelResult<()> {
        self.property.set(&mut target.borrow_mut(), value)
    }
}

/// A step found by looking up `get<Name>`/`set<Name>` accessors on a type
/// without persistence metadata. Always transient.
#[derive(Clone)]
pub struct ReflectedAccessor {
    name: String,
    value_type: ValueType,
    getter: Getter,
    setter: Option<Setter>,
}

impl ReflectedAccessor {
    pub fn new(name: &str, value_type: ValueType, getter: Getter, setter: Option<Setter>) -> Self {
        Self {
            name: name.into(),
            value_type,
            getter,
            setter,
        }
    }
}

impl fmt::Debug for ReflectedAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectedAccessor")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("writable", &self.setter.is_some())
            .finish()
    }
}

impl PropertyAccessor for ReflectedAccessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    fn nested_metadata(&self) -> Option<&Arc<ClassMetadata>> {
        None
    }

    fn is_persistent(&self) -> bool {
        false
    }

    fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    fn get(&self, target: &ObjectRef) -> Value {
        (self.getter)(&target.borrow())
    }

    fn set(&self, target: &ObjectRef, value: Value) -> ModelResult<()> {
        let Some(setter) = &self.setter else {
            return Err(ModelError::ReadOnly(self.name.clone()));
        };
        if !self.value_type.accepts(&value) {
            return Err(ModelError::TypeMismatch {
                property: self.name.clone(),
                expected: self.value_type.clone(),
                found: value.kind(),
            });
        }
        setter(&mut target.borrow_mut(), value)
    }
}

/// A fully resolved property name: the parent steps followed by the leaf.
#[derive(Clone)]
pub struct PropertyPath {
    name: String,
    parents: Vec<Rc<dyn PropertyAccessor>>,
    leaf: Rc<dyn PropertyAccessor>,
}

impl PropertyPath {
    pub(crate) fn root(leaf: Rc<dyn PropertyAccessor>) -> Self {
        Self {
            name: leaf.name().to_string(),
            parents: Vec::new(),
            leaf,
        }
    }

    /// Extends `self` by one step.
    pub(crate) fn child(&self, leaf: Rc<dyn PropertyAccessor>) -> Self {
        let mut parents = self.parents.clone();
        parents.push(Rc::clone(&self.leaf));
        Self {
            name: format!("{}.{}", self.name, leaf.name()),
            parents,
            leaf,
        }
    }

    /// The full dotted name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.parents.len() + 1
    }

    pub fn leaf(&self) -> &dyn PropertyAccessor {
        self.leaf.as_ref()
    }

    pub fn value_type(&self) -> &ValueType {
        self.leaf.value_type()
    }

    pub fn is_writable(&self) -> bool {
        self.leaf.is_writable()
    }

    pub fn is_persistent(&self) -> bool {
        self.leaf.is_persistent()
    }

    pub fn nested_metadata(&self) -> Option<&Arc<ClassMetadata>> {
        self.leaf.nested_metadata()
    }

    /// Reads the value at the end of the path. A null anywhere along the way
    /// reads as `Null`.
    pub fn get_value(&self, root: &ObjectRef) -> ContainerResult<Value> {
        let mut target = root.clone();
        for step in &self.parents {
            match step.get(&target) {
                Value::Null => return Ok(Value::Null),
                Value::Object(next) => target = next,
                other => return Err(not_an_object(step.as_ref(), &other)),
            }
        }
        Ok(self.leaf.get(&target))
    }

    /// Writes the value at the end of the path. Intermediate objects are
    /// never created.
    pub fn set_value(&self, root: &ObjectRef, value: Value) -> ContainerResult<()> {
        let mut target = root.clone();
        for step in &self.parents {
            match step.get(&target) {
                Value::Null => {
                    return Err(ContainerError::IllegalState(
                        "cannot set a property through a null path".into(),
                    ));
                }
                Value::Object(next) => target = next,
                other => return Err(not_an_object(step.as_ref(), &other)),
            }
        }
        self.leaf.set(&target, value)?;
        Ok(())
    }
}

impl fmt::Debug for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<&str> = self
            .parents
            .iter()
            .map(|s| s.name())
            .chain(std::iter::once(self.leaf.name()))
            .collect();
        f.debug_struct("PropertyPath")
            .field("name", &self.name)
            .field("steps", &steps)
            .field("value_type", self.leaf.value_type())
            .finish()
    }
}

fn not_an_object(step: &dyn PropertyAccessor, found: &Value) -> ContainerError {
    ContainerError::from(ModelError::NotAnObject {
        property: step.name().to_string(),
        found: found.kind(),
    })
}
