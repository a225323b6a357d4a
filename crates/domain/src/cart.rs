//! The user's embedded cart.

use common::ProductId;
use serde::Serialize;
use store::{CartItem, Product, Store, User};

use crate::error::DomainError;

/// A cart line with the catalog entry joined in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Current catalog entry; None when the product has been deleted
    /// since it was added.
    pub product: Option<Product>,
    pub quantity: u32,
}

/// Cart reads and mutations.
///
/// The cart lives inside the user record; every mutation rewrites it
/// through the store in one call.
pub struct CartService<S: Store> {
    store: S,
}

impl<S: Store> CartService<S> {
    /// Creates a new cart service.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the user's cart with product details joined.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn get(&self, user: &User) -> Result<Vec<CartLine>, DomainError> {
        let mut lines = Vec::with_capacity(user.cart.len());
        for item in &user.cart {
            lines.push(CartLine {
                product: self.store.get_product(item.product_id).await?,
                quantity: item.quantity,
            });
        }
        Ok(lines)
    }

    /// Adds a product to the cart, merging with an existing line.
    ///
    /// The product must exist and the added quantity must be within
    /// stock; the merged line is not re-checked, each addition is
    /// validated on its own.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn add(
        &self,
        user: &User,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Vec<CartItem>, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity { quantity });
        }
        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or(DomainError::ProductNotFound(product_id))?;
        if product.stock < quantity {
            return Err(DomainError::InsufficientStock {
                name: product.name,
                available: product.stock,
            });
        }

        let mut cart = user.cart.clone();
        match cart.iter_mut().find(|item| item.product_id == product_id) {
            Some(line) => line.quantity += quantity,
            None => cart.push(CartItem {
                product_id,
                quantity,
            }),
        }
        self.persist(user, cart).await
    }

    /// Sets the quantity of a line already in the cart.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn update_quantity(
        &self,
        user: &User,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Vec<CartItem>, DomainError> {
        if quantity == 0 {
            return Err(DomainError::InvalidQuantity { quantity });
        }
        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or(DomainError::ProductNotFound(product_id))?;
        if product.stock < quantity {
            return Err(DomainError::InsufficientStock {
                name: product.name,
                available: product.stock,
            });
        }

        let mut cart = user.cart.clone();
        let line = cart
            .iter_mut()
            .find(|item| item.product_id == product_id)
            .ok_or(DomainError::NotInCart(product_id))?;
        line.quantity = quantity;
        self.persist(user, cart).await
    }

    /// Removes a product from the cart. Removing an absent product is a
    /// no-op that returns the cart unchanged.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn remove(
        &self,
        user: &User,
        product_id: ProductId,
    ) -> Result<Vec<CartItem>, DomainError> {
        let mut cart = user.cart.clone();
        cart.retain(|item| item.product_id != product_id);
        self.persist(user, cart).await
    }

    async fn persist(&self, user: &User, cart: Vec<CartItem>) -> Result<Vec<CartItem>, DomainError> {
        if !self.store.set_cart(user.id, &cart).await? {
            return Err(DomainError::UserNotFound);
        }
        Ok(cart)
    }
}
