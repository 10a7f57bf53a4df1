use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use catalog_core::{Entity, Page, PageRequest};
use catalog_products::{NewProduct, Product, ProductId, ProductPatch};

use super::{ProductCatalogStore, StoreError, StoreResult};

#[derive(Debug)]
struct State {
    last_id: i64,
    rows: BTreeMap<ProductId, Product>,
}

/// In-memory product store.
///
/// Intended for tests/dev. Ids are handed out sequentially and never reused;
/// soft-deleted rows stay in the map, exactly as they stay in the table.
#[derive(Debug)]
pub struct InMemoryProductStore {
    state: RwLock<State>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                last_id: 0,
                rows: BTreeMap::new(),
            }),
        }
    }

    /// Every stored row, including soft-deleted ones (test inspection).
    pub fn all_rows(&self) -> StoreResult<Vec<Product>> {
        let state = self.read("all_rows")?;
        Ok(state.rows.values().cloned().collect())
    }

    fn read(&self, operation: &'static str) -> StoreResult<std::sync::RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StoreError::persistence(operation, "store lock poisoned"))
    }

    fn write(&self, operation: &'static str) -> StoreResult<std::sync::RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StoreError::persistence(operation, "store lock poisoned"))
    }

    /// Check-and-mutate under one write guard, mirroring the conditional UPDATE.
    fn mutate_available(
        &self,
        operation: &'static str,
        id: ProductId,
        f: impl FnOnce(&mut Product),
    ) -> StoreResult<Product> {
        let mut state = self.write(operation)?;
        match state.rows.get_mut(&id) {
            Some(product) if product.is_available() => {
                f(product);
                Ok(product.clone())
            }
            _ => Err(StoreError::NotFound(id)),
        }
    }
}

impl Default for InMemoryProductStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductCatalogStore for InMemoryProductStore {
    async fn create(&self, input: NewProduct) -> StoreResult<Product> {
        let mut state = self.write("create_product")?;
        state.last_id += 1;
        let id = ProductId::new(state.last_id);
        let product = Product::create(id, input, Utc::now());
        state.rows.insert(id, product.clone());
        Ok(product)
    }

    async fn find_all(&self, page: PageRequest) -> StoreResult<Page<Product>> {
        let state = self.read("find_all_products")?;
        let available = state.rows.values().filter(|p| p.is_available());

        let total = available.clone().count() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let data = available
            .skip(offset)
            .take(page.limit() as usize)
            .cloned()
            .collect();

        Ok(Page::new(data, page, total))
    }

    async fn find_one(&self, id: ProductId) -> StoreResult<Product> {
        let state = self.read("find_one_product")?;
        state
            .rows
            .get(&id)
            .filter(|p| p.is_available())
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product> {
        let now = Utc::now();
        self.mutate_available("update_product", id, |p| p.apply_patch(patch, now))
    }

    async fn remove(&self, id: ProductId) -> StoreResult<Product> {
        let now = Utc::now();
        self.mutate_available("remove_product", id, |p| p.mark_unavailable(now))
    }

    async fn find_available_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
        let state = self.read("find_products_by_ids")?;
        let mut found: Vec<Product> = ids
            .iter()
            .filter_map(|id| state.rows.get(id))
            .filter(|p| p.is_available())
            .cloned()
            .collect();
        found.sort_by_key(|p| p.id().get());
        found.dedup_by_key(|p| p.id().get());
        Ok(found)
    }
}
