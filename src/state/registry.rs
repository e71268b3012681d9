use crate::config::{Config, StorageKind};
use crate::db::Db;
use crate::db::repo::{AccountRepo, AccountRepository, ItemRepo, ItemRepository};
use crate::db::repo::{MemoryAccountRepository, MemoryItemRepository};
use crate::error::AppResult;
use crate::services::{AccountService, ItemService};
use crate::state::session_registry::SessionRegistry;
use std::sync::Arc;

pub struct Repos {
    pub account: Arc<dyn AccountRepo>,
    pub item: Arc<dyn ItemRepo>,
}

impl Repos {
    pub fn postgres(db: Arc<Db>) -> Self {
        Self {
            account: Arc::new(AccountRepository::new(db.clone())),
            item: Arc::new(ItemRepository::new(db)),
        }
    }

    pub fn memory() -> Self {
        Self {
            account: Arc::new(MemoryAccountRepository::new()),
            item: Arc::new(MemoryItemRepository::new()),
        }
    }
}

pub struct Services {
    /// Credential store
    pub account: Arc<AccountService>,
    /// Item store
    pub item: Arc<ItemService>,
}

/// Everything a connection needs, handed to each session at accept time.
pub struct Registry {
    pub config: Arc<Config>,
    pub services: Arc<Services>,
    pub sessions: SessionRegistry,
}

impl Registry {
    pub fn new(config: Arc<Config>, repos: Repos) -> Self {
        let services = Arc::new(Services {
            account: Arc::new(AccountService::new(repos.account)),
            item: Arc::new(ItemService::new(repos.item)),
        });

        Self {
            config,
            services,
            sessions: SessionRegistry::new(),
        }
    }

    /// Builds the registry for the configured storage, running migrations when
    /// backed by Postgres.
    pub async fn from_config(config: Arc<Config>) -> AppResult<Self> {
        let repos = match config.storage {
            StorageKind::Postgres => {
                let db = Arc::new(Db::new(&config.database_url, config.db_pool_size)?);
                db.init().await?;
                Repos::postgres(db)
            }
            StorageKind::Memory => {
                tracing::warn!("using in-memory storage, all data is lost on exit");
                Repos::memory()
            }
        };

        Ok(Self::new(config, repos))
    }

    pub fn in_memory(config: Config) -> Self {
        Self::new(Arc::new(config), Repos::memory())
    }
}
