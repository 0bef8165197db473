//! Change notifications delivered to container and property listeners.

use crate::ItemId;
use bindery_model::Value;
use std::rc::Rc;

/// Something changed in a container.
#[derive(Debug, Clone, PartialEq)]
pub enum ContainerEvent {
    /// Items were added or removed, or the filters changed.
    ItemSetChanged,
    /// The available property names changed.
    PropertySetChanged,
    /// A buffered item was committed.
    ItemModified { item_id: Option<ItemId> },
    /// A property was written through to an item's entity.
    ItemPropertyModified {
        item_id: Option<ItemId>,
        property: String,
    },
}

/// The value of one item property changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChangeEvent {
    pub item_id: Option<ItemId>,
    pub property: String,
    pub value: Value,
}

pub type ContainerListener = Rc<dyn Fn(&ContainerEvent)>;

pub type ValueChangeListener = Rc<dyn Fn(&ValueChangeEvent)>;
