//! Message patterns served by the catalog and their dispatch onto the store.

use core::str::FromStr;

use serde_json::Value;

use catalog_core::{Entity, Page};
use catalog_products::Product;

use crate::app::dto::{self, CreateProductRequest, PaginationRequest, ProductIdRequest, UpdateProductRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

/// Every message pattern the catalog answers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MessagePattern {
    CreateProduct,
    FindAllProducts,
    FindOneProduct,
    UpdateProduct,
    DeleteProduct,
    ValidateProducts,
}

impl MessagePattern {
    pub const ALL: [MessagePattern; 6] = [
        MessagePattern::CreateProduct,
        MessagePattern::FindAllProducts,
        MessagePattern::FindOneProduct,
        MessagePattern::UpdateProduct,
        MessagePattern::DeleteProduct,
        MessagePattern::ValidateProducts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MessagePattern::CreateProduct => "create_product",
            MessagePattern::FindAllProducts => "find_all_products",
            MessagePattern::FindOneProduct => "find_one_product",
            MessagePattern::UpdateProduct => "update_product",
            MessagePattern::DeleteProduct => "delete_product",
            MessagePattern::ValidateProducts => "validate_products",
        }
    }
}

impl FromStr for MessagePattern {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MessagePattern::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ApiError::UnknownPattern(s.to_string()))
    }
}

impl core::fmt::Display for MessagePattern {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode `data` for `pattern`, run it against the store, and render the result.
#[tracing::instrument(skip_all, fields(pattern = %pattern))]
pub async fn dispatch(services: &AppServices, pattern: MessagePattern, data: Value) -> Result<Value, ApiError> {
    let store = services.store();
    let name = pattern.as_str();

    match pattern {
        MessagePattern::CreateProduct => {
            let input = dto::decode::<CreateProductRequest>(name, data)?.into_input()?;
            let product = store.create(input).await?;
            tracing::info!(product_id = %product.id(), "product created");
            render(&product)
        }
        MessagePattern::FindAllProducts => {
            let request = if data.is_null() {
                PaginationRequest::default()
            } else {
                dto::decode::<PaginationRequest>(name, data)?
            };
            let page: Page<Product> = store.find_all(request.into_page_request()?).await?;
            render(&page)
        }
        MessagePattern::FindOneProduct => {
            let id = dto::decode::<ProductIdRequest>(name, data)?.product_id()?;
            render(&store.find_one(id).await?)
        }
        MessagePattern::UpdateProduct => {
            let (id, patch) = dto::decode::<UpdateProductRequest>(name, data)?.into_parts()?;
            let product = store.update(id, patch).await?;
            tracing::info!(product_id = %id, "product updated");
            render(&product)
        }
        MessagePattern::DeleteProduct => {
            let id = dto::decode::<ProductIdRequest>(name, data)?.product_id()?;
            let product = store.remove(id).await?;
            tracing::info!(product_id = %id, "product removed");
            render(&product)
        }
        MessagePattern::ValidateProducts => {
            let ids = dto::parse_product_ids(dto::decode::<Vec<i64>>(name, data)?)?;
            render(&store.validate_products(&ids).await?)
        }
    }
}

fn render<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Persistence(format!("failed to render response: {e}")))
}
