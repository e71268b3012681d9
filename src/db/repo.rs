mod account;
mod account_db;
mod account_mem;
mod item;
mod item_db;
mod item_mem;

pub use account_db::AccountRepository;
pub use account_mem::MemoryAccountRepository;
pub use item_db::ItemRepository;
pub use item_mem::MemoryItemRepository;

pub use account::AccountRepo;
pub use item::ItemRepo;
