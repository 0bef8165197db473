//! The active property names of a container, and the resolver behind them.

use crate::path::{MetadataAccessor, PropertyAccessor, PropertyPath, ReflectedAccessor};
use crate::{ContainerError, ContainerResult};
use bindery_model::{ClassMetadata, MetadataRegistry, Object, ObjectRef, Setter, Value, ValueType};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

/// Property names available on the items of one entity type.
///
/// Starts with every property of the root metadata. Nested names are added
/// with [`add_nested`](Self::add_nested). Resolved paths are memoized for the
/// lifetime of the list; removing a name leaves its path cached.
#[derive(Clone)]
pub struct PropertyList {
    registry: Arc<MetadataRegistry>,
    metadata: Arc<ClassMetadata>,
    names: BTreeSet<String>,
    persistent_names: BTreeSet<String>,
    paths: HashMap<String, Rc<PropertyPath>>,
}

impl PropertyList {
    pub fn new(registry: Arc<MetadataRegistry>, type_name: &str) -> ContainerResult<Self> {
        let metadata = registry
            .class(type_name)
            .cloned()
            .ok_or_else(|| ContainerError::InvalidArgument(format!("unknown entity type: {type_name}")))?;
        let mut list = Self {
            registry,
            metadata,
            names: BTreeSet::new(),
            persistent_names: BTreeSet::new(),
            paths: HashMap::new(),
        };
        let roots: Vec<(String, bool)> = list
            .metadata
            .properties()
            .iter()
            .map(|p| (p.name().to_string(), p.is_persistent()))
            .collect();
        for (name, persistent) in roots {
            list.resolve(&name)?;
            list.insert(name, persistent);
        }
        Ok(list)
    }

    pub fn metadata(&self) -> &Arc<ClassMetadata> {
        &self.metadata
    }

    /// Resolves `path` to its accessor chain, memoized.
    ///
    /// `path` does not need to be one of [`names`](Self::names).
    pub fn resolve(&mut self, path: &str) -> ContainerResult<Rc<PropertyPath>> {
        if let Some(resolved) = self.paths.get(path) {
            return Ok(Rc::clone(resolved));
        }

        let resolved = match path.rsplit_once('.') {
            None => {
                let property = self.metadata.property(path).ok_or_else(|| {
                    ContainerError::InvalidArgument(format!(
                        "{} has no property named {path}",
                        self.metadata.name()
                    ))
                })?;
                let nested = self.nested_metadata_of(property.is_persistent(), property.type_metadata());
                PropertyPath::root(Rc::new(MetadataAccessor::new(property.clone(), nested)))
            }
            Some((parent, child)) => {
                if parent.is_empty() || child.is_empty() {
                    return Err(ContainerError::InvalidArgument(format!(
                        "malformed property path: {path}"
                    )));
                }
                let parent = self.resolve(parent)?;
                let step = self.child_step(&parent, child)?;
                parent.child(step)
            }
        };

        debug!(
            property = path,
            depth = resolved.depth(),
            persistent = resolved.is_persistent(),
            "resolved property path"
        );
        let resolved = Rc::new(resolved);
        self.paths.insert(path.to_string(), Rc::clone(&resolved));
        Ok(resolved)
    }

    /// Adds a nested property, or with a trailing `.*` every property of
    /// the parent.
    pub fn add_nested(&mut self, name: &str) -> ContainerResult<()> {
        if !name.contains('.') {
            return Err(ContainerError::InvalidArgument(format!("{name} is not nested")));
        }

        let Some(parent_name) = name.strip_suffix(".*") else {
            let path = self.resolve(name)?;
            self.insert(name.to_string(), path.is_persistent());
            return Ok(());
        };

        let parent = self.resolve(parent_name)?;
        let children: Vec<(String, bool)> = match parent.nested_metadata() {
            Some(nested) => nested
                .properties()
                .iter()
                .map(|p| (p.name().to_string(), p.is_persistent()))
                .collect(),
            None => self
                .reflected_names(parent.value_type())
                .into_iter()
                .map(|n| (n, false))
                .collect(),
        };

        debug!(parent = parent_name, count = children.len(), "expanding wildcard property");
        for (child, persistent) in children {
            let full = format!("{parent_name}.{child}");
            self.resolve(&full)?;
            self.insert(full, persistent);
        }
        Ok(())
    }

    /// Removes `name`. Returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        self.persistent_names.remove(name);
        self.names.remove(name)
    }

    /// Every available property name.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.names.iter()
    }

    /// The names that are persistent, usable for sorting and filtering.
    pub fn persistent_names(&self) -> impl Iterator<Item = &String> {
        self.persistent_names.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_persistent(&self, name: &str) -> bool {
        self.persistent_names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn property_type(&self, name: &str) -> ContainerResult<ValueType> {
        Ok(self.path(name)?.value_type().clone())
    }

    pub fn is_writable(&self, name: &str) -> ContainerResult<bool> {
        Ok(self.path(name)?.is_writable())
    }

    pub fn get_value(&self, entity: &ObjectRef, name: &str) -> ContainerResult<Value> {
        self.path(name)?.get_value(entity)
    }

    pub fn set_value(&self, entity: &ObjectRef, name: &str, value: Value) -> ContainerResult<()> {
        self.path(name)?.set_value(entity, value)
    }

    /// The resolved path of an available name.
    fn path(&self, name: &str) -> ContainerResult<&Rc<PropertyPath>> {
        if !self.names.contains(name) {
            return Err(ContainerError::InvalidArgument(format!(
                "unknown property: {name}"
            )));
        }
        self.paths.get(name).ok_or_else(|| {
            ContainerError::IllegalState(format!("property {name} was never resolved"))
        })
    }

    fn insert(&mut self, name: String, persistent: bool) {
        if persistent {
            self.persistent_names.insert(name.clone());
        }
        self.names.insert(name);
    }

    /// Nested metadata follows only persistent embedded and reference
    /// properties.
    fn nested_metadata_of(
        &self,
        persistent: bool,
        type_metadata: Option<&str>,
    ) -> Option<Arc<ClassMetadata>> {
        if !persistent {
            return None;
        }
        type_metadata.and_then(|t| self.registry.class(t)).cloned()
    }

    fn child_step(
        &self,
        parent: &PropertyPath,
        child: &str,
    ) -> ContainerResult<Rc<dyn PropertyAccessor>> {
        if let Some(nested) = parent.nested_metadata() {
            let property = nested.property(child).ok_or_else(|| {
                ContainerError::InvalidArgument(format!(
                    "{} has no property named {child}",
                    nested.name()
                ))
            })?;
            let metadata = self.nested_metadata_of(property.is_persistent(), property.type_metadata());
            return Ok(Rc::new(MetadataAccessor::new(property.clone(), metadata)));
        }

        let Some(type_name) = parent.value_type().object_type() else {
            return Err(ContainerError::InvalidArgument(format!(
                "{} is a {} property and has no nested properties",
                parent.name(),
                parent.value_type()
            )));
        };
        self.reflect(type_name, child)
            .ok_or_else(|| {
                ContainerError::InvalidArgument(format!("{type_name} has no readable property {child}"))
            })
    }

    /// Accessor lookup on a type without persistent nested metadata. Bean
    /// accessor tables take precedence; a registered class falls back to
    /// its declared properties.
    fn reflect(&self, type_name: &str, child: &str) -> Option<Rc<dyn PropertyAccessor>> {
        if let Some(bean) = self.registry.bean(type_name) {
            let (returns, getter) = bean.find_getter(child)?;
            let setter = bean.find_setter(child, returns).cloned();
            return Some(Rc::new(ReflectedAccessor::new(
                child,
                returns.clone(),
                Arc::clone(getter),
                setter,
            )));
        }

        let property = self.registry.class(type_name)?.property(child)?.clone();
        let reader = property.clone();
        let writer = property.clone();
        let setter = property.is_writable().then(|| {
            Arc::new(move |o: &mut Object, v: Value| writer.set(o, v)) as Setter
        });
        Some(Rc::new(ReflectedAccessor::new(
            child,
            property.value_type().clone(),
            Arc::new(move |o: &Object| reader.get(o)),
            setter,
        )))
    }

    fn reflected_names(&self, value_type: &ValueType) -> Vec<String> {
        let Some(type_name) = value_type.object_type() else {
            return Vec::new();
        };
        if let Some(bean) = self.registry.bean(type_name) {
            return bean.readable_properties();
        }
        self.registry
            .class(type_name)
            .map(|c| c.properties().iter().map(|p| p.name().to_string()).collect())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for PropertyList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyList")
            .field("type", &self.metadata.name())
            .field("names", &self.names)
            .field("persistent_names", &self.persistent_names)
            .finish()
    }
}
