use super::{Db, DbResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use std::str::FromStr;
use tokio_postgres::NoTls;

impl Db {
    /// Builds the pool without connecting; connections open on first use.
    pub fn new(url: &str, max_size: usize) -> DbResult<Self> {
        let mut cfg = tokio_postgres::Config::from_str(url)?;
        if cfg.get_application_name().is_none() {
            cfg.application_name(env!("CARGO_PKG_NAME"));
        }

        let mgr = Manager::from_config(
            cfg,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let pool = Pool::builder(mgr)
            .max_size(max_size.max(1))
            .runtime(Runtime::Tokio1)
            .build()?;
        tracing::debug!(max_size = pool.status().max_size, "database pool ready");

        Ok(Self { pool })
    }
}
