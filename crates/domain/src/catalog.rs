//! Product catalog reads and admin CRUD.

use common::{Money, ProductId};
use serde::Deserialize;
use store::{Product, Store};

use crate::error::DomainError;

/// Fields for a new catalog entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    pub category: String,
    pub stock: u32,
    #[serde(default)]
    pub image_url: String,
}

/// Replacement fields for an existing catalog entry.
///
/// The image URL is optional so an update without a new image keeps the
/// existing one.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    pub category: String,
    pub stock: u32,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Catalog operations.
pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    /// Creates a new catalog service.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists the catalog, newest first.
    pub async fn list(&self) -> Result<Vec<Product>, DomainError> {
        Ok(self.store.list_products().await?)
    }

    /// Fetches one catalog entry.
    pub async fn get(&self, id: ProductId) -> Result<Product, DomainError> {
        self.store
            .get_product(id)
            .await?
            .ok_or(DomainError::ProductNotFound(id))
    }

    /// Creates a catalog entry.
    #[tracing::instrument(skip(self, new))]
    pub async fn create(&self, new: NewProduct) -> Result<Product, DomainError> {
        if new.name.trim().is_empty() {
            return Err(DomainError::MissingField("name"));
        }
        if new.category.trim().is_empty() {
            return Err(DomainError::MissingField("category"));
        }
        if new.price.is_negative() {
            return Err(DomainError::InvalidPrice(new.price));
        }

        let product = Product::new(
            new.name,
            new.description,
            new.price,
            new.category,
            new.stock,
            new.image_url,
        );
        self.store.insert_product(&product).await?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Replaces an existing catalog entry's fields.
    #[tracing::instrument(skip(self, update))]
    pub async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, DomainError> {
        if update.price.is_negative() {
            return Err(DomainError::InvalidPrice(update.price));
        }

        let mut product = self.get(id).await?;
        product.name = update.name;
        product.description = update.description;
        product.price = update.price;
        product.category = update.category;
        product.stock = update.stock;
        if let Some(image_url) = update.image_url {
            product.image_url = image_url;
        }

        if !self.store.update_product(&product).await? {
            return Err(DomainError::ProductNotFound(id));
        }
        Ok(product)
    }

    /// Deletes a catalog entry.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<(), DomainError> {
        if !self.store.delete_product(id).await? {
            return Err(DomainError::ProductNotFound(id));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}
