//! Order endpoints for the storefront.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::{Mailer, OrderView, PlaceOrder};
use store::{Order, Store};

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::parse_order_id;

/// POST /api/orders — place an order for the caller.
#[tracing::instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn create<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    AuthUser(user): AuthUser,
    Json(req): Json<PlaceOrder>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state.orders.place_order(&user, req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders — the caller's orders, newest first.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    Ok(Json(state.orders.list_for_user(user.id).await?))
}

/// GET /api/orders/{id} — one of the caller's orders; someone else's
/// order reads as not found.
#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OrderView>, ApiError> {
    let id = parse_order_id(&id)?;
    Ok(Json(state.orders.get_for_user(id, user.id).await?))
}
