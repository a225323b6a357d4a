//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::ProductId;
use domain::{CartLine, Mailer};
use serde::{Deserialize, Serialize};
use store::{CartItem, Store};

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::parse_product_id;

fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub message: &'static str,
    pub cart: Vec<CartItem>,
}

/// GET /api/cart — the caller's cart with product details joined.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<CartLine>>, ApiError> {
    Ok(Json(state.carts.get(&user).await?))
}

/// POST /api/cart/add — add a product, merging with an existing line.
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn add<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    AuthUser(user): AuthUser,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.add(&user, req.product_id, req.quantity).await?;
    Ok(Json(CartResponse {
        message: "Product added to cart",
        cart,
    }))
}

/// PUT /api/cart/update — set the quantity of a line already in the cart.
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn update<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    AuthUser(user): AuthUser,
    Json(req): Json<UpdateCartRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .update_quantity(&user, req.product_id, req.quantity)
        .await?;
    Ok(Json(CartResponse {
        message: "Cart updated",
        cart,
    }))
}

/// DELETE /api/cart/remove/{product_id} — drop a line from the cart.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    AuthUser(user): AuthUser,
    Path(product_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let product_id = parse_product_id(&product_id)?;
    let cart = state.carts.remove(&user, product_id).await?;
    Ok(Json(CartResponse {
        message: "Product removed from cart",
        cart,
    }))
}
