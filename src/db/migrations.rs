mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

use super::{Db, DbResult};

impl Db {
    /// Brings the schema up to date. Already applied migrations are skipped.
    pub async fn init(&self) -> DbResult<()> {
        let mut client = self.pool.get().await?;
        let report = embedded::migrations::runner().run_async(&mut **client).await?;

        let applied = report.applied_migrations();
        if applied.is_empty() {
            tracing::debug!("database schema is up to date");
        }
        for migration in applied {
            tracing::info!(version = migration.version(), name = migration.name(), "applied migration");
        }

        Ok(())
    }
}
