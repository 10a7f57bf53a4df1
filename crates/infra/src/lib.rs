//! Infrastructure layer: SQLite persistence, configuration, product stores.

pub mod config;
pub mod db;
pub mod store;


pub use config::{CatalogConfig, ConfigError};
pub use store::{InMemoryProductStore, ProductCatalogStore, SqliteProductStore, StoreError, StoreResult};
