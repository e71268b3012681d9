use crate::db::DbResult;
use crate::models::account::Account;

#[async_trait::async_trait]
pub trait AccountRepo: Send + Sync {
    async fn get_by_email(&self, email: &str) -> DbResult<Option<Account>>;
    /// Stores a new account. Fails with `DbError::UniqueViolation` when the email is taken.
    async fn insert_account(&self, account: Account) -> DbResult<Account>;
    async fn count(&self) -> DbResult<u64>;
}
