use crate::db::DbResult;
use crate::db::error::DbError;
use crate::db::repo::account::AccountRepo;
use crate::models::account::Account;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Ephemeral account storage, lost on restart.
#[derive(Default)]
pub struct MemoryAccountRepository {
    accounts: DashMap<String, Account>,
}

impl MemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AccountRepo for MemoryAccountRepository {
    async fn get_by_email(&self, email: &str) -> DbResult<Option<Account>> {
        Ok(self.accounts.get(email).map(|a| a.value().clone()))
    }

    async fn insert_account(&self, account: Account) -> DbResult<Account> {
        match self.accounts.entry(account.email.0.clone()) {
            Entry::Occupied(_) => Err(DbError::UniqueViolation),
            Entry::Vacant(slot) => {
                slot.insert(account.clone());
                Ok(account)
            }
        }
    }

    async fn count(&self) -> DbResult<u64> {
        Ok(self.accounts.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::identity::Identity;

    fn account(email: &str) -> Account {
        Account {
            email: Identity(email.to_string()),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_unique_violation() {
        let repo = MemoryAccountRepository::new();
        repo.insert_account(account("a@b.c")).await.unwrap();

        let err = repo.insert_account(account("a@b.c")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation));
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
