//! Request payloads and their mapping to validated domain input.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use catalog_core::{DomainResult, PageRequest};
use catalog_products::{NewProduct, ProductId, ProductPatch};

use crate::app::errors::ApiError;

/// Decode a message payload; `null` stands for a missing payload.
pub fn decode<T: DeserializeOwned>(pattern: &str, data: Value) -> Result<T, ApiError> {
    serde_json::from_value(data)
        .map_err(|e| ApiError::Validation(format!("invalid payload for {pattern}: {e}")))
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price: Decimal,
}

impl CreateProductRequest {
    pub fn into_input(self) -> DomainResult<NewProduct> {
        NewProduct::new(self.name, self.price)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationRequest {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl PaginationRequest {
    pub fn into_page_request(self) -> DomainResult<PageRequest> {
        PageRequest::new(self.page, self.limit)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductIdRequest {
    pub id: i64,
}

impl ProductIdRequest {
    pub fn product_id(&self) -> DomainResult<ProductId> {
        ProductId::parse(self.id)
    }
}

/// `id` selects the product; it is never written.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProductRequest {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pub price: Option<Decimal>,
}

impl UpdateProductRequest {
    pub fn into_parts(self) -> DomainResult<(ProductId, ProductPatch)> {
        let id = ProductId::parse(self.id)?;
        let patch = ProductPatch::new(self.name, self.price)?;
        Ok((id, patch))
    }
}

pub fn parse_product_ids(raw: Vec<i64>) -> DomainResult<Vec<ProductId>> {
    raw.into_iter().map(ProductId::parse).collect()
}
