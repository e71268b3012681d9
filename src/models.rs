pub mod account;
pub mod identity;
pub mod item;
