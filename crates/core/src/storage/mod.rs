use anyhow::Context;

pub mod cache;
pub mod file;
pub mod memory;
pub mod postgres;

pub use cache::{CacheEntry, CacheError, TipCache};
pub use file::FileKvStore;
pub use memory::MemoryKvStore;
pub use postgres::PgKvStore;

/// String key-value storage. Writes overwrite; there is no merge or versioning at this level.
#[async_trait::async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;

    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}
