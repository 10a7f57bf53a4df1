//! SQLite-backed product store.
//!
//! ## Query Shape
//!
//! - Reads filter on `available = 1` and order by `id ASC`, which keeps offset
//!   pagination stable across pages.
//! - `find_all` reads the count and the page inside one transaction, so `meta`
//!   and `data` describe the same snapshot.
//! - `update` / `remove` are single `UPDATE ... WHERE id = ? AND available = 1
//!   RETURNING ...` statements; zero rows means not found.
//! - Id-set lookups bind at most [`MAX_IDS_PER_QUERY`] ids per statement and
//!   merge the chunks in id order.
//! - `updated_at` is written as `MAX(now, created_at)` so it never precedes
//!   `created_at`, even if the wall clock steps backwards.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::{Span, instrument};

use catalog_core::{Entity, Page, PageRequest};
use catalog_products::{Availability, NewProduct, Price, Product, ProductId, ProductName, ProductPatch};

use async_trait::async_trait;

use super::{ProductCatalogStore, StoreError, StoreResult};

/// Upper bound on bound `IN (...)` parameters per statement; SQLite caps
/// host parameters per statement (32766 on current builds, 999 on old ones).
const MAX_IDS_PER_QUERY: usize = 900;

/// Raw `product` row as SQLite returns it.
#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: String,
    available: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let corrupt = |e: &dyn core::fmt::Display| {
            StoreError::persistence("decode_product_row", format!("row {}: {e}", row.id))
        };

        let name = ProductName::parse(row.name.as_str()).map_err(|e| corrupt(&e))?;
        let price: Price = row.price.parse().map_err(|e| corrupt(&e))?;
        let created_at = parse_timestamp(&row.created_at).map_err(|e| corrupt(&e))?;
        let updated_at = parse_timestamp(&row.updated_at).map_err(|e| corrupt(&e))?;

        Product::restore(
            ProductId::new(row.id),
            name,
            price,
            Availability::from_flag(row.available),
            created_at,
            updated_at,
        )
        .map_err(|e| corrupt(&e))
    }
}

/// Fixed-width RFC 3339 text (`2024-01-31T09:15:00.000000Z`).
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::persistence(operation, format!("database error: {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => StoreError::persistence(operation, "connection pool closed"),
        sqlx::Error::PoolTimedOut => {
            StoreError::persistence(operation, "timed out waiting for a connection")
        }
        other => StoreError::persistence(operation, other.to_string()),
    }
}

/// Product store over a SQLite connection pool.
///
/// Holds the pool by composition; connecting and migrating happen in
/// [`crate::db`]. Cloning is cheap (the pool is reference-counted).
#[derive(Debug, Clone)]
pub struct SqliteProductStore {
    pool: SqlitePool,
}

impl SqliteProductStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl ProductCatalogStore for SqliteProductStore {
    #[instrument(skip(self, input), fields(name = %input.name), err)]
    async fn create(&self, input: NewProduct) -> StoreResult<Product> {
        let now = format_timestamp(Utc::now());

        let row: ProductRow = sqlx::query_as(
            r#"
            INSERT INTO product (name, price, available, created_at, updated_at)
            VALUES (?1, ?2, 1, ?3, ?3)
            RETURNING id, name, price, available, created_at, updated_at
            "#,
        )
        .bind(input.name.as_str())
        .bind(input.price.to_string())
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_product", e))?;

        let product = Product::try_from(row)?;
        tracing::info!(id = %product.id(), "product created");
        Ok(product)
    }

    #[instrument(
        skip(self),
        fields(page = page.page(), limit = page.limit(), total = tracing::field::Empty),
        err
    )]
    async fn find_all(&self, page: PageRequest) -> StoreResult<Page<Product>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product WHERE available = 1")
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("count_products", e))?;

        let rows: Vec<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, name, price, available, created_at, updated_at
            FROM product
            WHERE available = 1
            ORDER BY id ASC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(i64::from(page.limit()))
        .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("find_all_products", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        let total = u64::try_from(total).unwrap_or(0);
        Span::current().record("total", total);

        let data = rows
            .into_iter()
            .map(Product::try_from)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Page::new(data, page, total))
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn find_one(&self, id: ProductId) -> StoreResult<Product> {
        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, name, price, available, created_at, updated_at
            FROM product
            WHERE id = ?1 AND available = 1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_one_product", e))?;

        row.ok_or(StoreError::NotFound(id))?.try_into()
    }

    #[instrument(skip(self, patch), fields(id = %id, empty_patch = patch.is_empty()), err)]
    async fn update(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product> {
        let now = format_timestamp(Utc::now());

        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            UPDATE product
            SET name       = COALESCE(?2, name),
                price      = COALESCE(?3, price),
                updated_at = MAX(?4, created_at)
            WHERE id = ?1 AND available = 1
            RETURNING id, name, price, available, created_at, updated_at
            "#,
        )
        .bind(id.get())
        .bind(patch.name.as_ref().map(|n| n.as_str().to_string()))
        .bind(patch.price.map(|p| p.to_string()))
        .bind(&now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?;

        let product: Product = row.ok_or(StoreError::NotFound(id))?.try_into()?;
        tracing::info!("product updated");
        Ok(product)
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn remove(&self, id: ProductId) -> StoreResult<Product> {
        let now = format_timestamp(Utc::now());

        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            UPDATE product
            SET available  = 0,
                updated_at = MAX(?2, created_at)
            WHERE id = ?1 AND available = 1
            RETURNING id, name, price, available, created_at, updated_at
            "#,
        )
        .bind(id.get())
        .bind(&now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("remove_product", e))?;

        let product: Product = row.ok_or(StoreError::NotFound(id))?.try_into()?;
        tracing::info!("product soft-deleted");
        Ok(product)
    }

    #[instrument(skip(self, ids), fields(requested = ids.len()), err)]
    async fn find_available_by_ids(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
        let mut found = Vec::new();

        for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
            let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
                "SELECT id, name, price, available, created_at, updated_at \
                 FROM product WHERE available = 1 AND id IN (",
            );
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(id.get());
            }
            separated.push_unseparated(")");

            let rows: Vec<ProductRow> = builder
                .build_query_as()
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("find_products_by_ids", e))?;

            for row in rows {
                found.push(Product::try_from(row)?);
            }
        }

        found.sort_by_key(|p| p.id().get());
        found.dedup_by_key(|p| p.id().get());
        Ok(found)
    }
}
