use crate::db::repo::account::AccountRepo;
use crate::db::{Db, DbResult, map_row_opt};
use crate::models::account::Account;
use std::sync::Arc;

pub struct AccountRepository {
    db: Arc<Db>,
}

impl AccountRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db: db.clone() }
    }
}

#[async_trait::async_trait]
impl AccountRepo for AccountRepository {
    async fn get_by_email(&self, email: &str) -> DbResult<Option<Account>> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(" SELECT email, password_hash FROM users WHERE email = $1 ")
            .await?;

        let row_opt = client.query_opt(&stmt, &[&email]).await?;
        map_row_opt(
            row_opt,
            Account::try_from_row,
            &format!("AccountRepo::get_by_email email={}", email),
        )
    }

    async fn insert_account(&self, account: Account) -> DbResult<Account> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(
                r#"
                INSERT INTO users (email, password_hash)
                VALUES ($1, $2)
                RETURNING email, password_hash
                "#,
            )
            .await?;

        let row = client
            .query_one(&stmt, &[&account.email.as_str(), &account.password_hash])
            .await?;

        Account::try_from_row(&row)
    }

    async fn count(&self) -> DbResult<u64> {
        let client = self.db.get_client().await?;

        let row = client.query_one("SELECT COUNT(*) AS n FROM users", &[]).await?;
        let n: i64 = row.try_get("n")?;

        Ok(n as u64)
    }
}
