use serde::{Deserialize, Serialize};

/// How an item's property proxies relate to the wrapped entity.
///
/// There is no mode that reads from a buffer while writing through, so
/// "read-through off, write-through on" cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferMode {
    /// Reads and writes go straight to the entity.
    #[default]
    Direct,
    /// Writes are buffered until commit; unmodified properties read the
    /// entity.
    WriteBuffered,
    /// Reads and writes both go to the buffer.
    Buffered,
}

impl BufferMode {
    pub fn is_read_through(self) -> bool {
        !matches!(self, BufferMode::Buffered)
    }

    pub fn is_write_through(self) -> bool {
        matches!(self, BufferMode::Direct)
    }
}

/// Progress of an item's pending edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EditState {
    #[default]
    Clean,
    Pending,
    Committing,
}

impl EditState {
    pub fn is_modified(self) -> bool {
        self != EditState::Clean
    }
}
