//! Back-office endpoints: dashboard, product CRUD, orders, and sales.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use domain::{
    AdminOrderView, DashboardSummary, Mailer, NewProduct, ProductUpdate, SalesPeriod, SalesReport,
};
use serde::{Deserialize, Serialize};
use store::{Order, Product, Store};

use crate::AppState;
use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::routes::{parse_order_id, parse_product_id};

/// GET /api/admin/dashboard — product count, recent orders, all-time
/// completed revenue.
#[tracing::instrument(skip(state, _admin))]
pub async fn dashboard<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<DashboardSummary>, ApiError> {
    Ok(Json(state.reports.dashboard().await?))
}

/// POST /api/admin/products — create a catalog entry.
#[tracing::instrument(skip(state, _admin, req))]
pub async fn create_product<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    AdminUser(_admin): AdminUser,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = state.catalog.create(req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /api/admin/products — the catalog, newest first.
#[tracing::instrument(skip(state, _admin))]
pub async fn list_products<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.catalog.list().await?))
}

/// GET /api/admin/products/{id} — one catalog entry.
#[tracing::instrument(skip(state, _admin))]
pub async fn get_product<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_product_id(&id)?;
    Ok(Json(state.catalog.get(id).await?))
}

/// PUT /api/admin/products/{id} — replace a catalog entry's fields.
#[tracing::instrument(skip(state, _admin, req))]
pub async fn update_product<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<ProductUpdate>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_product_id(&id)?;
    Ok(Json(state.catalog.update(id, req).await?))
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub message: &'static str,
}

/// DELETE /api/admin/products/{id} — remove a catalog entry.
#[tracing::instrument(skip(state, _admin))]
pub async fn delete_product<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let id = parse_product_id(&id)?;
    state.catalog.delete(id).await?;
    Ok(Json(DeletedResponse {
        message: "Product deleted successfully",
    }))
}

/// GET /api/admin/orders — every order, buyers and products joined.
#[tracing::instrument(skip(state, _admin))]
pub async fn list_orders<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<AdminOrderView>>, ApiError> {
    Ok(Json(state.orders.list_all().await?))
}

/// GET /api/admin/orders/{id} — one order with joins.
#[tracing::instrument(skip(state, _admin))]
pub async fn get_order<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<AdminOrderView>, ApiError> {
    let id = parse_order_id(&id)?;
    Ok(Json(state.orders.get(id).await?))
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// PATCH /api/admin/orders/{id}/status — overwrite an order's status.
#[tracing::instrument(skip(state, _admin, req))]
pub async fn update_order_status<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<Order>, ApiError> {
    let id = parse_order_id(&id)?;
    Ok(Json(state.orders.update_status(id, &req.status).await?))
}

#[derive(Debug, Deserialize)]
pub struct SalesQuery {
    pub period: Option<String>,
}

/// GET /api/admin/sales — the sales report for a window.
#[tracing::instrument(skip(state, _admin))]
pub async fn sales<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<SalesQuery>,
) -> Result<Json<SalesReport>, ApiError> {
    let period = SalesPeriod::parse(query.period.as_deref());
    Ok(Json(state.reports.sales(period).await?))
}
