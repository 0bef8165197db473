use bindery_model::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of an item inside its container.
///
/// Persistent items use the entity identifier. Entities added to a buffered
/// container get a temporary id until the container is committed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemId {
    Int(i64),
    Text(String),
    Temporary(Uuid),
}

impl ItemId {
    /// A fresh temporary id (UUID v7, time-ordered).
    #[must_use]
    pub fn temporary() -> Self {
        ItemId::Temporary(Uuid::now_v7())
    }

    /// Converts an identifier value. Only integer and text identifiers are
    /// supported.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(ItemId::Int(*i)),
            Value::Text(s) => Some(ItemId::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ItemId::Int(i) => Value::Int(*i),
            ItemId::Text(s) => Value::Text(s.clone()),
            ItemId::Temporary(u) => Value::Text(u.to_string()),
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, ItemId::Temporary(_))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Int(i) => write!(f, "{i}"),
            ItemId::Text(s) => f.write_str(s),
            ItemId::Temporary(u) => write!(f, "tmp-{u}"),
        }
    }
}

impl From<i64> for ItemId {
    fn from(i: i64) -> Self {
        ItemId::Int(i)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId::Text(s.to_string())
    }
}
