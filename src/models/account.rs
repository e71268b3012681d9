use crate::db::DbResult;
use crate::models::identity::Identity;
use tokio_postgres::Row;

#[derive(Debug, Clone)]
pub struct Account {
    /// Email address, the unique login key
    pub email: Identity,
    /// Hashed password (argon2, PHC string)
    pub password_hash: String,
}

impl Account {
    pub fn try_from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            email: Identity(row.try_get("email")?),
            password_hash: row.try_get("password_hash")?,
        })
    }
}
