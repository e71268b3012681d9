mod account;
mod error;
mod item;

pub use account::{AccountService, LoginResult};
pub use item::ItemService;

pub use error::ServiceError;
