use common::ProductId;
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A line item referenced a product that does not exist.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// A conditional stock decrement failed because not enough stock
    /// was available.
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// A stored text value could not be decoded into its typed form.
    #[error("invalid {field} value: {value}")]
    Decode { field: &'static str, value: String },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
