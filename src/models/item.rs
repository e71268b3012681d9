use crate::db::DbResult;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

/// Store-assigned item identifier. Zero means "not assigned yet".
pub type ItemId = i64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique per identity, assigned by the item store
    #[serde(default)]
    pub id: ItemId,
    /// Item text
    #[serde(default)]
    pub what: String,
    /// Completion time as epoch seconds, 0 when not completed
    #[serde(default, rename = "completedAt")]
    pub completed_at: i64,
}

impl Item {
    pub fn new(what: impl Into<String>) -> Self {
        Self {
            id: 0,
            what: what.into(),
            completed_at: 0,
        }
    }

    /// An item carrying only its id, used to announce deletions.
    pub fn tombstone(id: ItemId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn has_id(&self) -> bool {
        self.id > 0
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at != 0
    }

    pub fn try_from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            what: row.try_get("what")?,
            completed_at: row.try_get("completed_at")?,
        })
    }
}
