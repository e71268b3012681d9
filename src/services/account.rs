use crate::db::error::DbError;
use crate::db::repo::AccountRepo;
use crate::error::{LoginError, RegisterError};
use crate::models::account::Account;
use crate::models::identity::Identity;
use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use std::sync::Arc;

/// The credential store: creates and verifies (email, password) pairs.
pub struct AccountService {
    repo: Arc<dyn AccountRepo>,
    argon: Argon2<'static>,
}

pub type LoginResult<T> = Result<T, LoginError>;

impl AccountService {
    pub fn new(repo: Arc<dyn AccountRepo>) -> Self {
        let argon = Argon2::default();
        Self { repo, argon }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<Identity, RegisterError> {
        let Some(email) = Identity::parse(email) else {
            return Err(RegisterError::InvalidInput);
        };
        if password.is_empty() {
            return Err(RegisterError::InvalidInput);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| RegisterError::InternalError(format!("cannot hash password: {e}")))?
            .to_string();

        let account = Account {
            email: email.clone(),
            password_hash: hash,
        };

        match self.repo.insert_account(account).await {
            Ok(_) => Ok(email),
            Err(DbError::UniqueViolation) => Err(RegisterError::AlreadyExists),
            Err(e) => Err(RegisterError::InternalError(e.to_string())),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> LoginResult<Account> {
        let Some(email) = Identity::parse(email) else {
            return Err(LoginError::UserNotFound);
        };

        let Some(account) = self
            .repo
            .get_by_email(email.as_str())
            .await
            .map_err(|e| LoginError::InternalError(e.to_string()))?
        else {
            return Err(LoginError::UserNotFound);
        };

        let parsed = PasswordHash::new(&account.password_hash)
            .map_err(|_| LoginError::InternalError("cannot parse stored password hash".into()))?;
        if self.argon.verify_password(password.as_bytes(), &parsed).is_err() {
            return Err(LoginError::InvalidPassword);
        };

        Ok(account)
    }

    pub async fn count(&self) -> Result<u64, DbError> {
        self.repo.count().await
    }
}
