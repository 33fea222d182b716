#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a store feature: `memory` or `sqlite`.");

use async_trait::async_trait;
use shop_types::ports::unit_of_work::UnitOfWorkFactory;
use shop_types::ports::RepoError;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

mod staging;

/// Feature-switched store façade. With both features enabled the SQLite
/// adapter wins; the in-memory adapter stays available directly through
/// [`memory::MemoryStore`].
#[derive(Clone)]
pub struct Store {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    memory: memory::MemoryStore,
    #[cfg(feature = "sqlite")]
    sqlite: sqlite::SqliteStore,
}

pub async fn build_store(url: Option<&str>) -> anyhow::Result<Store> {
    Store::build_store(url).await
}

impl Store {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_store(_: Option<&str>) -> anyhow::Result<Self> {
        Ok(Self {
            memory: memory::MemoryStore::new(),
        })
    }

    #[cfg(feature = "sqlite")]
    pub async fn build_store(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or("sqlite://shopadmin.db");
        let sqlite = sqlite::SqliteStore::new(url).await?;
        Ok(Self { sqlite })
    }
}

#[cfg(all(feature = "memory", not(feature = "sqlite")))]
#[async_trait]
impl UnitOfWorkFactory for Store {
    type Uow = memory::MemoryUnitOfWork;

    async fn begin(&self) -> Result<Self::Uow, RepoError> {
        self.memory.begin().await
    }
}

#[cfg(feature = "sqlite")]
#[async_trait]
impl UnitOfWorkFactory for Store {
    type Uow = sqlite::SqliteUnitOfWork;

    async fn begin(&self) -> Result<Self::Uow, RepoError> {
        self.sqlite.begin().await
    }
}
