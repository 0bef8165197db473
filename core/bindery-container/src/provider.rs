//! The persistence collaborator behind a container.

use crate::ItemId;
use bindery_model::{ClassMetadata, ObjectRef, Value};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by an [`EntityProvider`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("entity not found: {0}")]
    NotFound(ItemId),

    #[error("entity already exists: {0}")]
    Duplicate(ItemId),

    #[error("entity has no usable identifier")]
    MissingIdentifier,

    #[error("provider rejected the entity: {0}")]
    Rejected(String),

    #[error("backend error: {0}")]
    Backend(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Loads and stores the entities of one type.
///
/// Implementations hand out entities the container may mutate freely; what
/// they store is only changed through `add_entity` and `update_entity`.
pub trait EntityProvider {
    /// The entity stored under `id`.
    fn entity(&self, id: &ItemId) -> ProviderResult<Option<ObjectRef>>;

    /// A fresh copy of `entity` from storage, `None` if it no longer exists.
    fn refresh_entity(&self, entity: &ObjectRef) -> ProviderResult<Option<ObjectRef>>;

    /// Stores a new entity, assigning an identifier if it has none.
    fn add_entity(&self, entity: ObjectRef) -> ProviderResult<ObjectRef>;

    /// Stores the current state of an existing entity.
    fn update_entity(&self, entity: &ObjectRef) -> ProviderResult<ObjectRef>;

    fn remove_entity(&self, id: &ItemId) -> ProviderResult<()>;

    /// The identifier of `entity`, if it has one.
    fn identifier(&self, entity: &ObjectRef) -> Option<ItemId>;
}

/// An [`EntityProvider`] that keeps snapshots in memory.
///
/// Integer identifiers are assigned in sequence to entities added without
/// one.
pub struct InMemoryEntityProvider {
    metadata: Arc<ClassMetadata>,
    rows: RefCell<BTreeMap<ItemId, ObjectRef>>,
    next_id: Cell<i64>,
}

impl InMemoryEntityProvider {
    pub fn new(metadata: Arc<ClassMetadata>) -> Self {
        Self {
            metadata,
            rows: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.borrow().is_empty()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.rows.borrow().contains_key(id)
    }

    /// Ids of every stored entity, in order.
    pub fn ids(&self) -> Vec<ItemId> {
        self.rows.borrow().keys().cloned().collect()
    }

    fn assign_identifier(&self, entity: &ObjectRef) -> ProviderResult<ItemId> {
        if let Some(id) = self.identifier(entity) {
            if let ItemId::Int(i) = id {
                self.next_id.set(self.next_id.get().max(i.saturating_add(1)));
            }
            return Ok(id);
        }

        let property = self
            .metadata
            .identifier_property()
            .ok_or(ProviderError::MissingIdentifier)?;
        let id = self.next_id.get();
        if id == i64::MAX {
            return Err(ProviderError::Backend("identifier space exhausted".into()));
        }
        self.metadata
            .set_property_value(entity, property.name(), Value::Int(id))
            .map_err(|e| ProviderError::Rejected(e.to_string()))?;
        self.next_id.set(id + 1);
        Ok(ItemId::Int(id))
    }
}

impl EntityProvider for InMemoryEntityProvider {
    fn entity(&self, id: &ItemId) -> ProviderResult<Option<ObjectRef>> {
        Ok(self.rows.borrow().get(id).map(ObjectRef::deep_clone))
    }

    fn refresh_entity(&self, entity: &ObjectRef) -> ProviderResult<Option<ObjectRef>> {
        match self.identifier(entity) {
            Some(id) => self.entity(&id),
            None => Ok(None),
        }
    }

    fn add_entity(&self, entity: ObjectRef) -> ProviderResult<ObjectRef> {
        if entity.type_name() != self.metadata.name() {
            return Err(ProviderError::Rejected(format!(
                "expected a {}, got a {}",
                self.metadata.name(),
                entity.type_name()
            )));
        }
        let id = self.assign_identifier(&entity)?;
        let mut rows = self.rows.borrow_mut();
        if rows.contains_key(&id) {
            return Err(ProviderError::Duplicate(id));
        }
        rows.insert(id, entity.deep_clone());
        Ok(entity)
    }

    fn update_entity(&self, entity: &ObjectRef) -> ProviderResult<ObjectRef> {
        let id = self.identifier(entity).ok_or(ProviderError::MissingIdentifier)?;
        let mut rows = self.rows.borrow_mut();
        match rows.get_mut(&id) {
            Some(row) => {
                *row = entity.deep_clone();
                Ok(entity.clone())
            }
            None => Err(ProviderError::NotFound(id)),
        }
    }

    fn remove_entity(&self, id: &ItemId) -> ProviderResult<()> {
        self.rows
            .borrow_mut()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ProviderError::NotFound(id.clone()))
    }

    fn identifier(&self, entity: &ObjectRef) -> Option<ItemId> {
        ItemId::from_value(&self.metadata.identifier_value(entity))
    }
}
