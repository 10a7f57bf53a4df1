use std::sync::Arc;

use catalog_infra::config::DatabaseConfig;
use catalog_infra::{InMemoryProductStore, ProductCatalogStore, SqliteProductStore, db};

/// Shared application services handed to every handler.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn ProductCatalogStore>,
}

impl AppServices {
    pub fn new(store: Arc<dyn ProductCatalogStore>) -> Self {
        Self { store }
    }

    /// Services backed by a process-local store (tests/dev).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryProductStore::new()))
    }

    pub fn store(&self) -> &dyn ProductCatalogStore {
        self.store.as_ref()
    }
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices").finish_non_exhaustive()
    }
}

/// Connect to the configured database, bring the schema up to date, and wire
/// the SQLite-backed store.
pub async fn build_services(config: &DatabaseConfig) -> Result<AppServices, sqlx::Error> {
    let pool = db::connect(config).await?;
    db::migrate(&pool).await?;
    Ok(AppServices::new(Arc::new(SqliteProductStore::new(pool))))
}
