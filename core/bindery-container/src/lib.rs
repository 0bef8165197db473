//! Entity containers for data-bound widgets.
//!
//! An [`EntityContainer`] exposes the entities of one type as items whose
//! properties may be arbitrarily deep paths such as `address.street`:
//! - [`PropertyList`]: the active property names and the memoized resolver
//! - [`PropertyPath`]: a resolved chain of [`PropertyAccessor`] steps
//! - [`EntityItem`]: one entity with per-property proxies and buffered editing
//! - [`EntityProvider`]: the persistence collaborator the container talks to
//!
//! Everything here is single-threaded: values are `Rc`-shared, and callers
//! keep one container per UI session.

mod buffer;
mod config;
mod container;
mod error;
mod event;
mod item;
mod item_id;
mod path;
mod property;
mod property_list;
mod provider;

pub use buffer::{BufferMode, EditState};
pub use config::ContainerConfig;
pub use container::EntityContainer;
pub use error::{ContainerError, ContainerResult};
pub use event::{ContainerEvent, ContainerListener, ValueChangeEvent, ValueChangeListener};
pub use item::EntityItem;
pub use item_id::ItemId;
pub use path::{MetadataAccessor, PropertyAccessor, PropertyPath, ReflectedAccessor};
pub use property::EntityItemProperty;
pub use property_list::PropertyList;
pub use provider::{EntityProvider, InMemoryEntityProvider, ProviderError, ProviderResult};
