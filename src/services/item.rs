use crate::db::repo::ItemRepo;
use crate::models::identity::Identity;
use crate::models::item::{Item, ItemId};
use crate::services::ServiceError;
use std::sync::Arc;

/// The item store as seen by a session.
pub struct ItemService {
    repo: Arc<dyn ItemRepo>,
}

impl ItemService {
    pub fn new(repo: Arc<dyn ItemRepo>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, owner: &Identity) -> Result<Vec<Item>, ServiceError> {
        Ok(self.repo.list(owner).await?)
    }

    pub async fn insert(&self, owner: &Identity, item: &Item) -> Result<Item, ServiceError> {
        if item.what.trim().is_empty() {
            return Err(ServiceError::InvalidInput("invalid item"));
        }
        Ok(self.repo.insert(owner, item).await?)
    }

    pub async fn update(&self, owner: &Identity, item: &Item) -> Result<(), ServiceError> {
        if !item.has_id() {
            return Err(ServiceError::InvalidInput("invalid item"));
        }
        match self.repo.update(owner, item).await? {
            true => Ok(()),
            false => Err(ServiceError::NotFound { entity: "item" }),
        }
    }

    pub async fn delete(&self, owner: &Identity, id: ItemId) -> Result<(), ServiceError> {
        if id <= 0 {
            return Err(ServiceError::InvalidInput("invalid item"));
        }
        match self.repo.delete(owner, id).await? {
            true => Ok(()),
            false => Err(ServiceError::NotFound { entity: "item" }),
        }
    }
}
