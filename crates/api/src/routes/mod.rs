//! Route handlers.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod contact;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use common::{OrderId, ProductId};

use crate::error::ApiError;

pub(crate) fn parse_product_id(id: &str) -> Result<ProductId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid product ID format: {e}")))?;
    Ok(ProductId::from_uuid(uuid))
}

pub(crate) fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID format: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
