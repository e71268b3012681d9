use crate::db::DbResult;
use crate::models::identity::Identity;
use crate::models::item::{Item, ItemId};

/// Item persistence. Every operation is scoped to the owning identity.
#[async_trait::async_trait]
pub trait ItemRepo: Send + Sync {
    async fn list(&self, owner: &Identity) -> DbResult<Vec<Item>>;
    /// Inserts the item and returns it with its generated id.
    async fn insert(&self, owner: &Identity, item: &Item) -> DbResult<Item>;
    /// Returns false when no item with that id exists for the owner.
    async fn update(&self, owner: &Identity, item: &Item) -> DbResult<bool>;
    /// Returns false when no item with that id exists for the owner.
    async fn delete(&self, owner: &Identity, id: ItemId) -> DbResult<bool>;
}
