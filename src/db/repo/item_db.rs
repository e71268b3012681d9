use crate::db::repo::item::ItemRepo;
use crate::db::{Db, DbResult, map_rows};
use crate::models::identity::Identity;
use crate::models::item::{Item, ItemId};
use std::sync::Arc;

pub struct ItemRepository {
    db: Arc<Db>,
}

impl ItemRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db: db.clone() }
    }
}

#[async_trait::async_trait]
impl ItemRepo for ItemRepository {
    async fn list(&self, owner: &Identity) -> DbResult<Vec<Item>> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("SELECT id, what, completed_at FROM items WHERE email = $1 ORDER BY id")
            .await?;

        let rows = client.query(&stmt, &[&owner.as_str()]).await?;
        map_rows(&rows, Item::try_from_row, &format!("ItemRepo::list email={}", owner))
    }

    async fn insert(&self, owner: &Identity, item: &Item) -> DbResult<Item> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(
                r#"
                INSERT INTO items (email, what, completed_at)
                VALUES ($1, $2, $3)
                RETURNING id, what, completed_at
                "#,
            )
            .await?;

        let row = client
            .query_one(&stmt, &[&owner.as_str(), &item.what, &item.completed_at])
            .await?;

        Item::try_from_row(&row)
    }

    async fn update(&self, owner: &Identity, item: &Item) -> DbResult<bool> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("UPDATE items SET what = $1, completed_at = $2 WHERE id = $3 AND email = $4")
            .await?;

        let n = client
            .execute(&stmt, &[&item.what, &item.completed_at, &item.id, &owner.as_str()])
            .await?;

        Ok(n > 0)
    }

    async fn delete(&self, owner: &Identity, id: ItemId) -> DbResult<bool> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("DELETE FROM items WHERE id = $1 AND email = $2")
            .await?;

        let n = client.execute(&stmt, &[&id, &owner.as_str()]).await?;

        Ok(n > 0)
    }
}
