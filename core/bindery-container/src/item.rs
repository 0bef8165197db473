//! Items: one entity wrapped with per-property proxies and buffered editing.

use crate::container::ContainerShared;
use crate::property::ItemProperty;
use crate::{
    BufferMode, ContainerError, ContainerEvent, ContainerResult, EditState, EntityItemProperty,
    ItemId, PropertyList, ValueChangeEvent, ValueChangeListener,
};
use bindery_model::{ModelError, ObjectRef, Value, ValueType};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

/// One entity of a container.
///
/// Property proxies are created on first access. With write-through on
/// (the default, [`BufferMode::Direct`]) proxy writes go straight to the
/// entity; otherwise they are held until [`commit`](Self::commit).
pub struct EntityItem {
    container: Rc<ContainerShared>,
    entity: ObjectRef,
    item_id: Option<ItemId>,
    properties: PropertyList,
    proxies: BTreeMap<String, ItemProperty>,
    persistent: bool,
    deleted: bool,
    edit: EditState,
    mode: BufferMode,
}

impl EntityItem {
    pub(crate) fn new(
        container: Rc<ContainerShared>,
        properties: PropertyList,
        entity: ObjectRef,
        item_id: Option<ItemId>,
        persistent: bool,
        mode: BufferMode,
    ) -> Self {
        Self {
            container,
            entity,
            persistent: persistent && item_id.is_some(),
            item_id,
            properties,
            proxies: BTreeMap::new(),
            deleted: false,
            edit: EditState::Clean,
            mode,
        }
    }

    // ── Identity ────────────────────────────────────────────────────

    pub fn item_id(&self) -> Option<&ItemId> {
        self.item_id.as_ref()
    }

    /// The wrapped entity. Writes made through it bypass buffering.
    pub fn entity(&self) -> &ObjectRef {
        &self.entity
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn is_modified(&self) -> bool {
        self.edit.is_modified()
    }

    pub fn edit_state(&self) -> EditState {
        self.edit
    }

    /// Persistent and modified.
    pub fn is_dirty(&self) -> bool {
        self.persistent && self.is_modified()
    }

    /// Removed from an auto-commit container.
    pub fn is_deleted(&self) -> bool {
        self.persistent && !self.container.is_buffered() && self.deleted
    }

    /// Removed through its container, whether or not the removal is
    /// committed yet.
    pub(crate) fn is_removed(&self) -> bool {
        self.deleted
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    pub(crate) fn mark_persisted(&mut self, id: ItemId) {
        self.item_id = Some(id);
        self.persistent = true;
    }

    // ── Properties ──────────────────────────────────────────────────

    pub fn item_property_ids(&self) -> impl Iterator<Item = &String> {
        self.properties.names()
    }

    pub fn has_item_property(&self, name: &str) -> bool {
        self.properties.contains(name)
    }

    /// The proxy of `name`, created on first access. `None` for names the
    /// item does not expose.
    pub fn item_property(&mut self, name: &str) -> Option<EntityItemProperty<'_>> {
        if !self.materialize(name) {
            return None;
        }
        Some(EntityItemProperty::new(self, name))
    }

    /// Properties backed by something other than the entity are not
    /// supported.
    pub fn add_item_property(&mut self, name: &str) -> ContainerResult<bool> {
        Err(ContainerError::Unsupported(format!(
            "cannot add external property {name} to an entity item"
        )))
    }

    /// Exposes a nested property on this item only.
    pub fn add_nested_property(&mut self, name: &str) -> ContainerResult<()> {
        self.properties.add_nested(name)
    }

    /// Removes a nested property from this item. Flat properties stay and
    /// `false` is returned.
    pub fn remove_item_property(&mut self, name: &str) -> bool {
        if !name.contains('.') {
            return false;
        }
        self.proxies.remove(name);
        self.properties.remove(name)
    }

    pub fn item_property_type(&self, name: &str) -> ContainerResult<ValueType> {
        self.properties.property_type(name)
    }

    pub fn is_item_property_writable(&self, name: &str) -> ContainerResult<bool> {
        Ok(!self.container.is_read_only() && self.properties.is_writable(name)?)
    }

    pub fn is_item_property_persistent(&self, name: &str) -> bool {
        self.properties.is_persistent(name)
    }

    /// Reads `name` from the entity, bypassing any buffer.
    pub fn item_property_value(&self, name: &str) -> ContainerResult<Value> {
        self.properties.get_value(&self.entity, name)
    }

    /// Writes `name` on the entity, bypassing the proxies.
    ///
    /// The item is modified afterwards even with write-through on, where the
    /// container is told right away. [`commit`](Self::commit),
    /// [`discard`](Self::discard) or [`refresh`](Self::refresh) clear it.
    pub fn set_item_property_value(
        &mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> ContainerResult<()> {
        if self.container.is_read_only() {
            return Err(ContainerError::ReadOnly(name.to_string()));
        }
        self.properties.set_value(&self.entity, name, value.into())?;
        self.edit = EditState::Pending;

        if self.mode.is_write_through() {
            self.container
                .item_property_modified(self, name)
                .map_err(|e| ContainerError::for_item(self.item_id.clone(), e))?;
        }
        Ok(())
    }

    // ── Buffering ───────────────────────────────────────────────────

    pub fn buffer_mode(&self) -> BufferMode {
        self.mode
    }

    pub fn is_read_through(&self) -> bool {
        self.mode.is_read_through()
    }

    pub fn is_write_through(&self) -> bool {
        self.mode.is_write_through()
    }

    pub fn is_buffered(&self) -> bool {
        self.mode == BufferMode::Buffered
    }

    /// Turning write-through on commits pending edits first and also turns
    /// read-through on.
    pub fn set_write_through(&mut self, on: bool) -> ContainerResult<()> {
        if on == self.mode.is_write_through() {
            return Ok(());
        }
        if on {
            self.commit()?;
            for proxy in self.proxies.values_mut() {
                proxy.shadow = None;
                proxy.modified = false;
            }
            self.mode = BufferMode::Direct;
        } else {
            for (name, proxy) in &mut self.proxies {
                proxy.shadow = self.properties.get_value(&self.entity, name).ok();
                proxy.modified = false;
            }
            self.mode = BufferMode::WriteBuffered;
        }
        debug!(item = ?self.item_id, mode = ?self.mode, "item write-through changed");
        Ok(())
    }

    /// Read-through can only be turned off once write-through is off.
    pub fn set_read_through(&mut self, on: bool) -> ContainerResult<()> {
        if on == self.mode.is_read_through() {
            return Ok(());
        }
        if !on && self.mode.is_write_through() {
            return Err(ContainerError::IllegalState(
                "read-through cannot be disabled while write-through is enabled".into(),
            ));
        }
        if on {
            self.mode = BufferMode::WriteBuffered;
        } else {
            for (name, proxy) in &mut self.proxies {
                if !proxy.modified {
                    proxy.shadow = self.properties.get_value(&self.entity, name).ok();
                }
            }
            self.mode = BufferMode::Buffered;
        }
        debug!(item = ?self.item_id, mode = ?self.mode, "item read-through changed");
        Ok(())
    }

    /// `true` turns both write-through and read-through off.
    pub fn set_buffered(&mut self, buffered: bool) -> ContainerResult<()> {
        self.set_write_through(!buffered)?;
        self.set_read_through(!buffered)
    }

    /// Writes buffered edits to the entity and tells the container.
    ///
    /// A failure leaves the item modified and is reported as
    /// [`ContainerError::Source`]. With write-through on the entity already
    /// holds every edit, so only the modified flag is cleared.
    pub fn commit(&mut self) -> ContainerResult<()> {
        if self.mode.is_write_through() {
            self.edit = EditState::Clean;
            return Ok(());
        }
        self.edit = EditState::Committing;

        let result = self
            .commit_proxies()
            .and_then(|()| self.container.item_modified(self));
        if let Err(cause) = result {
            self.edit = EditState::Pending;
            warn!(item = ?self.item_id, error = %cause, "item commit failed");
            return Err(ContainerError::for_item(self.item_id.clone(), cause));
        }

        self.edit = EditState::Clean;
        debug!(item = ?self.item_id, "item committed");
        Ok(())
    }

    /// Drops buffered edits and re-reads every proxy from the entity.
    /// Written-through edits cannot be reversed; only the modified flag is
    /// cleared.
    pub fn discard(&mut self) -> ContainerResult<()> {
        if self.mode.is_write_through() {
            self.edit = EditState::Clean;
            return Ok(());
        }
        let reverted = self.reseed_proxies();
        self.edit = EditState::Clean;
        debug!(item = ?self.item_id, reverted = reverted.len(), "item edits discarded");
        for name in reverted {
            self.fire_value_change(&name)?;
        }
        Ok(())
    }

    /// Reloads the entity from the provider, dropping buffered edits.
    ///
    /// If the entity is gone the item stops being persistent.
    pub fn refresh(&mut self) -> ContainerResult<()> {
        if !self.persistent {
            return Ok(());
        }
        match self.container.provider().refresh_entity(&self.entity)? {
            None => {
                warn!(item = ?self.item_id, "entity no longer exists in the provider");
                self.persistent = false;
                self.container.fire(ContainerEvent::ItemSetChanged);
            }
            Some(entity) => {
                self.entity = entity;
                if !self.mode.is_write_through() {
                    self.reseed_proxies();
                }
                self.edit = EditState::Clean;
                let names: Vec<String> = self.properties.names().cloned().collect();
                for name in names {
                    self.materialize(&name);
                    self.fire_value_change(&name)?;
                }
            }
        }
        Ok(())
    }

    // ── Listeners ───────────────────────────────────────────────────

    /// Registers `listener` on every available property.
    pub fn add_value_change_listener(&mut self, listener: ValueChangeListener) {
        let names: Vec<String> = self.properties.names().cloned().collect();
        for name in names {
            if self.materialize(&name) {
                if let Some(proxy) = self.proxies.get_mut(&name) {
                    proxy.listeners.push(Rc::clone(&listener));
                }
            }
        }
    }

    pub fn remove_value_change_listener(&mut self, listener: &ValueChangeListener) {
        for proxy in self.proxies.values_mut() {
            proxy.listeners.retain(|l| !Rc::ptr_eq(l, listener));
        }
    }

    // ── Proxy internals ─────────────────────────────────────────────

    /// Creates the proxy of `name` if needed. Buffered items seed the
    /// shadow from the entity.
    fn materialize(&mut self, name: &str) -> bool {
        if self.proxies.contains_key(name) {
            return true;
        }
        if !self.properties.contains(name) {
            return false;
        }
        let shadow = if self.mode.is_write_through() {
            None
        } else {
            self.properties.get_value(&self.entity, name).ok()
        };
        self.proxies.insert(
            name.to_string(),
            ItemProperty {
                shadow,
                ..ItemProperty::default()
            },
        );
        true
    }

    pub(crate) fn proxy(&self, name: &str) -> Option<&ItemProperty> {
        self.proxies.get(name)
    }

    pub(crate) fn proxy_mut(&mut self, name: &str) -> Option<&mut ItemProperty> {
        self.proxies.get_mut(name)
    }

    pub(crate) fn proxy_value(&self, name: &str) -> ContainerResult<Value> {
        if !self.mode.is_write_through() {
            if let Some(proxy) = self.proxies.get(name) {
                if proxy.modified || !self.mode.is_read_through() {
                    if let Some(shadow) = &proxy.shadow {
                        return Ok(shadow.clone());
                    }
                }
            }
        }
        self.item_property_value(name)
    }

    pub(crate) fn proxy_set(&mut self, name: &str, value: Value) -> ContainerResult<()> {
        if !self.is_item_property_writable(name)? {
            return Err(ContainerError::ReadOnly(name.to_string()));
        }
        let value_type = self.properties.property_type(name)?;
        if !value_type.accepts(&value) {
            return Err(ContainerError::InvalidArgument(
                ModelError::TypeMismatch {
                    property: name.to_string(),
                    expected: value_type,
                    found: value.kind(),
                }
                .to_string(),
            ));
        }

        if self.mode.is_write_through() {
            self.set_item_property_value(name, value)?;
        } else {
            let proxy = self.proxies.entry(name.to_string()).or_default();
            proxy.shadow = Some(value);
            proxy.modified = true;
            self.edit = EditState::Pending;
            debug!(item = ?self.item_id, property = name, "buffered property edit");
        }
        self.fire_value_change(name)
    }

    pub(crate) fn fire_value_change(&self, name: &str) -> ContainerResult<()> {
        let Some(proxy) = self.proxies.get(name) else {
            return Ok(());
        };
        if proxy.listeners.is_empty() {
            return Ok(());
        }
        let listeners = proxy.listeners.clone();
        let event = ValueChangeEvent {
            item_id: self.item_id.clone(),
            property: name.to_string(),
            value: self.proxy_value(name)?,
        };
        for listener in listeners {
            listener(&event);
        }
        Ok(())
    }

    /// Writes modified shadows to the entity. Stops at the first failure,
    /// leaving that proxy and the rest modified.
    fn commit_proxies(&mut self) -> ContainerResult<()> {
        for (name, proxy) in &mut self.proxies {
            if !proxy.modified {
                continue;
            }
            let value = proxy.shadow.clone().unwrap_or_default();
            self.properties.set_value(&self.entity, name, value)?;
            proxy.modified = false;
        }
        Ok(())
    }

    /// Re-reads every shadow from the entity. Returns the names that held
    /// edits.
    fn reseed_proxies(&mut self) -> Vec<String> {
        let mut reverted = Vec::new();
        for (name, proxy) in &mut self.proxies {
            if proxy.modified {
                reverted.push(name.clone());
            }
            proxy.shadow = self.properties.get_value(&self.entity, name).ok();
            proxy.modified = false;
        }
        reverted
    }
}

impl fmt::Debug for EntityItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityItem")
            .field("item_id", &self.item_id)
            .field("entity", &self.entity)
            .field("persistent", &self.persistent)
            .field("deleted", &self.deleted)
            .field("edit", &self.edit)
            .field("mode", &self.mode)
            .finish()
    }
}
