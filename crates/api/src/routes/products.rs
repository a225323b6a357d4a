//! Public catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::Mailer;
use store::{Product, Store};

use crate::AppState;
use crate::error::ApiError;
use crate::routes::parse_product_id;

/// GET /api/products — list the catalog, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.catalog.list().await?))
}

/// GET /api/products/{id} — fetch one catalog entry.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store, M: Mailer + 'static>(
    State(state): State<Arc<AppState<S, M>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_product_id(&id)?;
    Ok(Json(state.catalog.get(id).await?))
}
