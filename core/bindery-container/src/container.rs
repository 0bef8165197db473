//! The container: items, filters and the pending-change queue of one
//! entity type.

use crate::{
    BufferMode, ContainerConfig, ContainerError, ContainerEvent, ContainerListener,
    ContainerResult, EntityItem, EntityProvider, ItemId, PropertyList,
};
use bindery_filter::{AliasPrefix, Filter};
use bindery_model::{ClassMetadata, MetadataRegistry, ObjectRef, ValueType};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A change waiting for the next container commit.
#[derive(Debug)]
enum PendingChange {
    Add(ItemId, ObjectRef),
    Update(ItemId, ObjectRef),
    Remove(ItemId),
}

impl PendingChange {
    fn id(&self) -> &ItemId {
        match self {
            PendingChange::Add(id, _) | PendingChange::Update(id, _) | PendingChange::Remove(id) => id,
        }
    }
}

/// State shared between a container and the items it hands out.
pub(crate) struct ContainerShared {
    provider: Rc<dyn EntityProvider>,
    auto_commit: Cell<bool>,
    read_only: Cell<bool>,
    listeners: RefCell<Vec<ContainerListener>>,
    pending: RefCell<VecDeque<PendingChange>>,
}

impl ContainerShared {
    pub(crate) fn provider(&self) -> &dyn EntityProvider {
        self.provider.as_ref()
    }

    pub(crate) fn is_buffered(&self) -> bool {
        !self.auto_commit.get()
    }

    pub(crate) fn is_read_only(&self) -> bool {
        self.read_only.get()
    }

    pub(crate) fn fire(&self, event: ContainerEvent) {
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener(&event);
        }
    }

    /// A write-through property write reached the entity of `item`.
    pub(crate) fn item_property_modified(
        &self,
        item: &EntityItem,
        property: &str,
    ) -> ContainerResult<()> {
        self.store(item)?;
        self.fire(ContainerEvent::ItemPropertyModified {
            item_id: item.item_id().cloned(),
            property: property.to_string(),
        });
        Ok(())
    }

    /// Buffered edits of `item` were committed to its entity.
    pub(crate) fn item_modified(&self, item: &EntityItem) -> ContainerResult<()> {
        self.store(item)?;
        self.fire(ContainerEvent::ItemModified {
            item_id: item.item_id().cloned(),
        });
        Ok(())
    }

    /// Pushes the entity of a persistent item to the provider, or queues it.
    ///
    /// Items whose removal is queued or done are refused: an update after
    /// the remove could never be applied.
    fn store(&self, item: &EntityItem) -> ContainerResult<()> {
        let Some(id) = item.item_id().filter(|_| item.is_persistent()) else {
            return Ok(());
        };
        if item.is_removed() {
            return Err(ContainerError::IllegalState(format!(
                "item {id} was removed from the container"
            )));
        }
        if !self.is_buffered() {
            self.provider.update_entity(item.entity())?;
            return Ok(());
        }

        let mut pending = self.pending.borrow_mut();
        if pending
            .iter()
            .any(|change| matches!(change, PendingChange::Remove(staged) if staged == id))
        {
            return Err(ContainerError::IllegalState(format!(
                "item {id} is queued for removal"
            )));
        }
        let staged = pending.iter_mut().find_map(|change| match change {
            PendingChange::Update(staged, entity) if staged == id => Some(entity),
            _ => None,
        });
        match staged {
            Some(entity) => *entity = item.entity().clone(),
            None => pending.push_back(PendingChange::Update(id.clone(), item.entity().clone())),
        }
        Ok(())
    }

    fn apply(&self, change: &PendingChange) -> ContainerResult<()> {
        match change {
            PendingChange::Add(_, entity) => {
                self.provider.add_entity(entity.clone())?;
            }
            PendingChange::Update(_, entity) => {
                self.provider.update_entity(entity)?;
            }
            PendingChange::Remove(id) => self.provider.remove_entity(id)?,
        }
        Ok(())
    }

    /// Applies queued changes in order. On failure the failed change and
    /// everything after it stay queued.
    fn flush(&self) -> ContainerResult<usize> {
        let mut applied = 0;
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(change) = next else {
                return Ok(applied);
            };
            if let Err(e) = self.apply(&change) {
                warn!(item = %change.id(), error = %e, "container commit failed");
                self.pending.borrow_mut().push_front(change);
                return Err(e);
            }
            applied += 1;
        }
    }
}

/// The entities of one type exposed as [`EntityItem`]s.
///
/// Items are owned by the caller; the container keeps no item registry and
/// loads a fresh item for every [`item`](Self::item) call.
pub struct EntityContainer {
    shared: Rc<ContainerShared>,
    metadata: Arc<ClassMetadata>,
    properties: PropertyList,
    filters: Vec<Filter>,
    config: ContainerConfig,
}

impl EntityContainer {
    pub fn new(
        registry: Arc<MetadataRegistry>,
        entity_type: &str,
        provider: Rc<dyn EntityProvider>,
        config: ContainerConfig,
    ) -> ContainerResult<Self> {
        let properties = PropertyList::new(registry, entity_type)?;
        let metadata = Arc::clone(properties.metadata());
        info!(
            entity_type,
            properties = properties.len(),
            auto_commit = config.auto_commit,
            read_only = config.read_only,
            "entity container created"
        );
        Ok(Self {
            shared: Rc::new(ContainerShared {
                provider,
                auto_commit: Cell::new(config.auto_commit),
                read_only: Cell::new(config.read_only),
                listeners: RefCell::new(Vec::new()),
                pending: RefCell::new(VecDeque::new()),
            }),
            metadata,
            properties,
            filters: Vec::new(),
            config,
        })
    }

    pub fn entity_type(&self) -> &str {
        self.metadata.name()
    }

    pub fn metadata(&self) -> &Arc<ClassMetadata> {
        &self.metadata
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    // ── Properties ──────────────────────────────────────────────────

    pub fn property_list(&self) -> &PropertyList {
        &self.properties
    }

    /// Adds a nested property (or `parent.*`) to items created from now on.
    pub fn add_nested_container_property(&mut self, name: &str) -> ContainerResult<()> {
        self.properties.add_nested(name)?;
        self.shared.fire(ContainerEvent::PropertySetChanged);
        Ok(())
    }

    pub fn remove_container_property(&mut self, name: &str) -> bool {
        let removed = self.properties.remove(name);
        if removed {
            self.shared.fire(ContainerEvent::PropertySetChanged);
        }
        removed
    }

    pub fn container_property_ids(&self) -> impl Iterator<Item = &String> {
        self.properties.names()
    }

    /// Persistent properties, the only ones a provider can sort by.
    pub fn sortable_property_ids(&self) -> impl Iterator<Item = &String> {
        self.properties.persistent_names()
    }

    pub fn property_type(&self, name: &str) -> ContainerResult<ValueType> {
        self.properties.property_type(name)
    }

    // ── Items ───────────────────────────────────────────────────────

    fn default_mode(&self) -> BufferMode {
        if self.config.buffered_items {
            BufferMode::Buffered
        } else {
            BufferMode::Direct
        }
    }

    fn make_item(&self, entity: ObjectRef, id: Option<ItemId>, persistent: bool) -> EntityItem {
        EntityItem::new(
            Rc::clone(&self.shared),
            self.properties.clone(),
            entity,
            id,
            persistent,
            self.default_mode(),
        )
    }

    /// Wraps an entity that is not (yet) part of the container.
    pub fn create_entity_item(&self, entity: ObjectRef) -> EntityItem {
        self.make_item(entity, None, false)
    }

    /// Wraps an entity the provider already stores.
    pub fn wrap_entity(&self, entity: ObjectRef) -> EntityItem {
        let id = self.shared.provider.identifier(&entity);
        self.make_item(entity, id, true)
    }

    /// Loads the item stored under `id`. Items added to a buffered container
    /// are found by their temporary id until commit.
    pub fn item(&self, id: &ItemId) -> ContainerResult<Option<EntityItem>> {
        {
            let pending = self.shared.pending.borrow();
            for change in pending.iter() {
                match change {
                    PendingChange::Add(staged, entity) if staged == id => {
                        return Ok(Some(self.make_item(entity.clone(), Some(id.clone()), false)));
                    }
                    PendingChange::Remove(staged) if staged == id => return Ok(None),
                    _ => {}
                }
            }
        }
        if id.is_temporary() {
            return Ok(None);
        }
        let entity = self.shared.provider.entity(id)?;
        Ok(entity.map(|e| self.make_item(e, Some(id.clone()), true)))
    }

    pub fn contains_id(&self, id: &ItemId) -> ContainerResult<bool> {
        Ok(self.item(id)?.is_some())
    }

    /// Adds a new entity. Returns its identifier, or a temporary id when the
    /// container is buffered.
    pub fn add_entity(&mut self, entity: ObjectRef) -> ContainerResult<ItemId> {
        self.ensure_writable("add entities")?;
        if entity.type_name() != self.metadata.name() {
            return Err(ContainerError::InvalidArgument(format!(
                "expected a {}, got a {}",
                self.metadata.name(),
                entity.type_name()
            )));
        }

        let id = if self.is_buffered() {
            let id = ItemId::temporary();
            self.shared
                .pending
                .borrow_mut()
                .push_back(PendingChange::Add(id.clone(), entity));
            id
        } else {
            let stored = self.shared.provider.add_entity(entity)?;
            self.shared.provider.identifier(&stored).ok_or_else(|| {
                ContainerError::IllegalState("provider stored an entity without an identifier".into())
            })?
        };

        debug!(item = %id, buffered = self.is_buffered(), "entity added");
        self.shared.fire(ContainerEvent::ItemSetChanged);
        Ok(id)
    }

    /// Adds the entity of a detached item and makes the item persistent.
    pub fn add_item(&mut self, item: &mut EntityItem) -> ContainerResult<ItemId> {
        let id = self.add_entity(item.entity().clone())?;
        if !id.is_temporary() {
            item.mark_persisted(id.clone());
        }
        Ok(id)
    }

    /// Removes the entity of `item`. Returns `false` if the item was never
    /// part of the container.
    pub fn remove_item(&mut self, item: &mut EntityItem) -> ContainerResult<bool> {
        self.ensure_writable("remove items")?;
        let Some(id) = item.item_id().cloned() else {
            return Ok(false);
        };

        if id.is_temporary() {
            let mut pending = self.shared.pending.borrow_mut();
            let before = pending.len();
            pending.retain(|c| c.id() != &id);
            let removed = pending.len() != before;
            drop(pending);
            if removed {
                self.shared.fire(ContainerEvent::ItemSetChanged);
            }
            return Ok(removed);
        }
        if !item.is_persistent() {
            return Ok(false);
        }

        if self.is_buffered() {
            let mut pending = self.shared.pending.borrow_mut();
            pending.retain(|c| !matches!(c, PendingChange::Update(staged, _) if staged == &id));
            pending.push_back(PendingChange::Remove(id.clone()));
        } else {
            self.shared.provider.remove_entity(&id)?;
        }
        item.mark_deleted();
        debug!(item = %id, buffered = self.is_buffered(), "item removed");
        self.shared.fire(ContainerEvent::ItemSetChanged);
        Ok(true)
    }

    /// Removes the entity stored under `id`.
    pub fn remove_item_by_id(&mut self, id: &ItemId) -> ContainerResult<bool> {
        match self.item(id)? {
            Some(mut item) => self.remove_item(&mut item),
            None => Ok(false),
        }
    }

    fn ensure_writable(&self, what: &str) -> ContainerResult<()> {
        if self.is_read_only() {
            return Err(ContainerError::Unsupported(format!(
                "cannot {what}: container is read-only"
            )));
        }
        Ok(())
    }

    // ── Filters ─────────────────────────────────────────────────────

    pub fn add_container_filter(&mut self, filter: Filter) {
        debug!(filter = %filter.to_ql_string(), "container filter added");
        self.filters.push(filter);
        self.shared.fire(ContainerEvent::ItemSetChanged);
    }

    /// Adds a text match on a persistent property.
    pub fn add_string_filter(
        &mut self,
        property: &str,
        text: &str,
        ignore_case: bool,
        only_match_prefix: bool,
    ) -> ContainerResult<()> {
        if !self.properties.is_persistent(property) {
            return Err(ContainerError::InvalidArgument(format!(
                "{property} is not a persistent property and cannot be filtered"
            )));
        }
        self.add_container_filter(Filter::text_match(
            property,
            text,
            ignore_case,
            only_match_prefix,
        ));
        Ok(())
    }

    /// Removes every filter that references `property`.
    pub fn remove_container_filters(&mut self, property: &str) {
        let before = self.filters.len();
        self.filters
            .retain(|f| !f.referenced_properties().iter().any(|p| p == property));
        if self.filters.len() != before {
            self.shared.fire(ContainerEvent::ItemSetChanged);
        }
    }

    pub fn remove_all_container_filters(&mut self) {
        if !self.filters.is_empty() {
            self.filters.clear();
            self.shared.fire(ContainerEvent::ItemSetChanged);
        }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// The applied filters rendered as one conjunction, `None` when no
    /// filter is applied.
    pub fn where_clause(&self) -> ContainerResult<Option<String>> {
        let alias = AliasPrefix::new(self.config.root_alias.as_str());
        let clause = match self.filters.as_slice() {
            [] => None,
            [single] => Some(single.to_ql_string_with(&alias)),
            many => Some(Filter::and(many.iter().cloned())?.to_ql_string_with(&alias)),
        };
        Ok(clause)
    }

    // ── Buffering ───────────────────────────────────────────────────

    pub fn is_auto_commit(&self) -> bool {
        self.shared.auto_commit.get()
    }

    /// Not auto-commit.
    pub fn is_buffered(&self) -> bool {
        self.shared.is_buffered()
    }

    /// Turning auto-commit on commits queued changes first.
    pub fn set_auto_commit(&mut self, on: bool) -> ContainerResult<()> {
        if on && self.is_buffered() {
            self.commit()?;
        }
        self.shared.auto_commit.set(on);
        Ok(())
    }

    pub fn is_read_only(&self) -> bool {
        self.shared.is_read_only()
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.shared.read_only.set(read_only);
    }

    /// Whether changes are queued.
    pub fn is_modified(&self) -> bool {
        !self.shared.pending.borrow().is_empty()
    }

    /// Sends queued changes to the provider in the order they were made.
    pub fn commit(&mut self) -> ContainerResult<()> {
        let queued = self.shared.pending.borrow().len();
        if queued == 0 {
            return Ok(());
        }
        let applied = self.shared.flush()?;
        info!(entity_type = self.entity_type(), applied, "container committed");
        self.shared.fire(ContainerEvent::ItemSetChanged);
        Ok(())
    }

    /// Drops queued changes.
    pub fn discard(&mut self) {
        let dropped = {
            let mut pending = self.shared.pending.borrow_mut();
            let dropped = pending.len();
            pending.clear();
            dropped
        };
        if dropped > 0 {
            info!(entity_type = self.entity_type(), dropped, "container changes discarded");
            self.shared.fire(ContainerEvent::ItemSetChanged);
        }
    }

    // ── Listeners ───────────────────────────────────────────────────

    pub fn add_listener(&self, listener: ContainerListener) {
        self.shared.listeners.borrow_mut().push(listener);
    }

    pub fn remove_listener(&self, listener: &ContainerListener) {
        self.shared
            .listeners
            .borrow_mut()
            .retain(|l| !Rc::ptr_eq(l, listener));
    }
}

impl std::fmt::Debug for EntityContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityContainer")
            .field("entity_type", &self.metadata.name())
            .field("properties", &self.properties)
            .field("filters", &self.filters)
            .field("auto_commit", &self.is_auto_commit())
            .field("pending", &self.shared.pending.borrow().len())
            .finish()
    }
}
