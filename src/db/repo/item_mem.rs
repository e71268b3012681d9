use crate::db::DbResult;
use crate::db::repo::item::ItemRepo;
use crate::models::identity::Identity;
use crate::models::item::{Item, ItemId};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// Ephemeral item storage, lost on restart.
pub struct MemoryItemRepository {
    items: DashMap<Identity, BTreeMap<ItemId, Item>>,
    next_id: AtomicI64,
}

impl Default for MemoryItemRepository {
    fn default() -> Self {
        Self {
            items: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl MemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ItemRepo for MemoryItemRepository {
    async fn list(&self, owner: &Identity) -> DbResult<Vec<Item>> {
        Ok(self
            .items
            .get(owner)
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, owner: &Identity, item: &Item) -> DbResult<Item> {
        let stored = Item {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            ..item.clone()
        };
        self.items
            .entry(owner.clone())
            .or_default()
            .insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, owner: &Identity, item: &Item) -> DbResult<bool> {
        let Some(mut items) = self.items.get_mut(owner) else {
            return Ok(false);
        };
        match items.get_mut(&item.id) {
            Some(existing) => {
                *existing = item.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, owner: &Identity, id: ItemId) -> DbResult<bool> {
        let Some(mut items) = self.items.get_mut(owner) else {
            return Ok(false);
        };
        Ok(items.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(s: &str) -> Identity {
        Identity(s.to_string())
    }

    #[tokio::test]
    async fn items_are_scoped_per_owner() {
        let repo = MemoryItemRepository::new();
        let ada = ident("ada");
        let bob = ident("bob");

        let milk = repo.insert(&ada, &Item::new("milk")).await.unwrap();
        assert!(milk.has_id());

        assert_eq!(repo.list(&ada).await.unwrap(), vec![milk.clone()]);
        assert!(repo.list(&bob).await.unwrap().is_empty());

        // bob cannot touch ada's item
        assert!(!repo.update(&bob, &milk).await.unwrap());
        assert!(!repo.delete(&bob, milk.id).await.unwrap());

        assert!(repo.delete(&ada, milk.id).await.unwrap());
        assert!(!repo.delete(&ada, milk.id).await.unwrap());
    }

    #[tokio::test]
    async fn update_replaces_text_and_completion() {
        let repo = MemoryItemRepository::new();
        let ada = ident("ada");
        let mut item = repo.insert(&ada, &Item::new("bread")).await.unwrap();

        item.what = "rye bread".into();
        item.completed_at = 42;
        assert!(repo.update(&ada, &item).await.unwrap());
        assert_eq!(repo.list(&ada).await.unwrap(), vec![item]);
    }
}
