use crate::{ContainerResult, EntityItem, ValueChangeListener};
use bindery_model::{Value, ValueType};
use std::rc::Rc;

/// Per-item state of one property: the buffered value and its listeners.
#[derive(Default)]
pub(crate) struct ItemProperty {
    /// Buffered value while write-through is off. `None` until seeded.
    pub(crate) shadow: Option<Value>,
    pub(crate) modified: bool,
    pub(crate) listeners: Vec<ValueChangeListener>,
}

/// A borrowed handle on one property of an [`EntityItem`].
///
/// Reads and writes honour the item's buffering mode.
pub struct EntityItemProperty<'a> {
    item: &'a mut EntityItem,
    name: String,
}

impl<'a> EntityItemProperty<'a> {
    pub(crate) fn new(item: &'a mut EntityItem, name: &str) -> Self {
        Self {
            item,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn item(&self) -> &EntityItem {
        &*self.item
    }

    /// The value as seen through the buffer.
    pub fn value(&self) -> ContainerResult<Value> {
        self.item.proxy_value(&self.name)
    }

    pub fn set_value(&mut self, value: impl Into<Value>) -> ContainerResult<()> {
        self.item.proxy_set(&self.name, value.into())
    }

    pub fn value_type(&self) -> ContainerResult<ValueType> {
        self.item.item_property_type(&self.name)
    }

    pub fn is_read_only(&self) -> bool {
        !self.item.is_item_property_writable(&self.name).unwrap_or(false)
    }

    /// Whether this property holds a buffered edit.
    pub fn is_modified(&self) -> bool {
        self.item.proxy(&self.name).is_some_and(|p| p.modified)
    }

    pub fn add_value_change_listener(&mut self, listener: ValueChangeListener) {
        if let Some(proxy) = self.item.proxy_mut(&self.name) {
            proxy.listeners.push(listener);
        }
    }

    pub fn remove_value_change_listener(&mut self, listener: &ValueChangeListener) {
        if let Some(proxy) = self.item.proxy_mut(&self.name) {
            proxy.listeners.retain(|l| !Rc::ptr_eq(l, listener));
        }
    }

    /// Notifies listeners with the current value.
    pub fn fire_value_change(&self) -> ContainerResult<()> {
        self.item.fire_value_change(&self.name)
    }
}
