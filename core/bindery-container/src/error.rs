//! Error types for containers and items.

use crate::{ItemId, ProviderError};
use bindery_filter::FilterError;
use bindery_model::ModelError;
use thiserror::Error;

/// Result type for container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;

/// Errors that can occur while resolving, reading or editing items.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Unknown property name, malformed nested path, un-nestable flat name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Writing through a null intermediate property, disabling read-through
    /// before write-through.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// A structural edit this container or item does not allow.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// A write to a read-only property or container.
    #[error("{0} is read-only")]
    ReadOnly(String),

    /// Committing buffered edits failed.
    #[error("source error on item {}: {cause}", describe(.item))]
    Source {
        item: Option<ItemId>,
        cause: Box<ContainerError>,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

impl ContainerError {
    /// Wraps `cause` as a persistence-source error naming `item`.
    pub fn for_item(item: Option<ItemId>, cause: ContainerError) -> Self {
        ContainerError::Source {
            item,
            cause: Box::new(cause),
        }
    }
}

fn describe(item: &Option<ItemId>) -> String {
    item.as_ref()
        .map_or_else(|| "<detached>".to_string(), ToString::to_string)
}
