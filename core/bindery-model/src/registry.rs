use crate::{BeanType, ClassMetadata, ModelError, ModelResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only registry of class metadata and reflected bean types.
///
/// Built once and passed into containers; nothing in the workspace looks
/// metadata up through global state.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    classes: HashMap<String, Arc<ClassMetadata>>,
    beans: HashMap<String, Arc<BeanType>>,
}

impl MetadataRegistry {
    pub fn builder() -> MetadataRegistryBuilder {
        MetadataRegistryBuilder::default()
    }

    pub fn class(&self, name: &str) -> Option<&Arc<ClassMetadata>> {
        self.classes.get(name)
    }

    pub fn bean(&self, name: &str) -> Option<&Arc<BeanType>> {
        self.beans.get(name)
    }

    /// Class metadata, failing with [`ModelError::UnknownType`].
    pub fn require_class(&self, name: &str) -> ModelResult<&Arc<ClassMetadata>> {
        self.class(name)
            .ok_or_else(|| ModelError::UnknownType(name.into()))
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }
}

/// Builder for [`MetadataRegistry`].
#[derive(Default)]
pub struct MetadataRegistryBuilder {
    classes: Vec<ClassMetadata>,
    beans: Vec<BeanType>,
}

impl MetadataRegistryBuilder {
    pub fn class(mut self, metadata: ClassMetadata) -> Self {
        self.classes.push(metadata);
        self
    }

    pub fn bean(mut self, bean: BeanType) -> Self {
        self.beans.push(bean);
        self
    }

    /// Validates that every nested metadata reference names a registered
    /// class, then freezes the registry.
    pub fn build(self) -> ModelResult<Arc<MetadataRegistry>> {
        let classes: HashMap<String, Arc<ClassMetadata>> = self
            .classes
            .into_iter()
            .map(|c| (c.name().to_string(), Arc::new(c)))
            .collect();

        for class in classes.values() {
            for property in class.properties() {
                if let Some(nested) = property.type_metadata() {
                    if !classes.contains_key(nested) {
                        return Err(ModelError::UnknownType(nested.into()));
                    }
                }
            }
        }

        let beans = self
            .beans
            .into_iter()
            .map(|b| (b.name().to_string(), Arc::new(b)))
            .collect();

        Ok(Arc::new(MetadataRegistry { classes, beans }))
    }
}
