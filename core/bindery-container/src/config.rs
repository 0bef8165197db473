use bindery_filter::DEFAULT_ALIAS;
use serde::{Deserialize, Serialize};

/// Construction-time settings of an [`EntityContainer`](crate::EntityContainer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Push every change to the provider immediately. When off, adds,
    /// removes and item updates queue until `commit`.
    pub auto_commit: bool,
    /// Reject adds, removes and property writes.
    pub read_only: bool,
    /// New items start fully buffered instead of write-through.
    pub buffered_items: bool,
    /// Alias of the root entity in rendered where-clauses.
    pub root_alias: String,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            auto_commit: true,
            read_only: false,
            buffered_items: false,
            root_alias: DEFAULT_ALIAS.to_string(),
        }
    }
}
