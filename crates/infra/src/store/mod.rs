//! Product catalog storage: the store contract and its implementations.
//!
//! Every read, update and delete applies the availability filter
//! (`available = true`). Soft-deleted products are invisible: looking one up
//! yields the same [`StoreError::NotFound`] as an id that never existed.
//!
//! Update and remove are single conditional writes (`... WHERE id = ? AND
//! available = 1`), so a concurrent remove can never be overwritten by a
//! stale update.

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

use catalog_core::{Entity, Page, PageRequest};
use catalog_products::{NewProduct, Product, ProductId, ProductPatch};

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryProductStore;
pub use sqlite::SqliteProductStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Input rejected before any write.
    #[error("validation failed: {0}")]
    Validation(String),

    /// No available product has this id (never created, or soft-deleted).
    #[error("product with id #{0} not found")]
    NotFound(ProductId),

    /// The underlying storage failed; not recoverable locally.
    #[error("persistence failure in {operation}: {message}")]
    Persistence {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn persistence(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Persistence {
            operation,
            message: message.into(),
        }
    }
}

/// CRUD-with-soft-delete access to the product catalog.
///
/// Implementations hold no per-call state and need no external locking;
/// share them behind an `Arc`.
#[async_trait]
pub trait ProductCatalogStore: Send + Sync {
    /// Insert an available product with `created_at == updated_at == now`.
    async fn create(&self, input: NewProduct) -> StoreResult<Product>;

    /// One page of available products in ascending id order, plus the total count.
    async fn find_all(&self, page: PageRequest) -> StoreResult<Page<Product>>;

    async fn find_one(&self, id: ProductId) -> StoreResult<Product>;

    /// Apply the present patch fields and refresh `updated_at`.
    async fn update(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product>;

    /// Soft delete. Returns the product as it stands after the flag flip.
    async fn remove(&self, id: ProductId) -> StoreResult<Product>;

    /// Available products whose id is in `ids`, in ascending id order.
    /// Unknown and soft-deleted ids are skipped.
    async fn find_available_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>>;

    /// Check that every id names an available product.
    ///
    /// Duplicate ids are collapsed. Fails with [`StoreError::Validation`] listing
    /// the missing ids when any id is unknown or soft-deleted.
    async fn validate_products(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
        let wanted: Vec<ProductId> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        if wanted.is_empty() {
            return Err(StoreError::Validation(
                "at least one product id is required".to_string(),
            ));
        }

        let found = self.find_available_by_ids(&wanted).await?;
        if found.len() != wanted.len() {
            let found_ids: BTreeSet<ProductId> = found.iter().map(|p| *p.id()).collect();
            let missing = wanted
                .iter()
                .filter(|id| !found_ids.contains(id))
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(StoreError::Validation(format!(
                "some products were not found: {missing}"
            )));
        }

        Ok(found)
    }
}
