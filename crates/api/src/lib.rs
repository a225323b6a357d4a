//! HTTP API server for the dairy shop backend.
//!
//! Exposes the storefront (auth, catalog, cart, orders, contact) and the
//! admin back-office (product CRUD, order workflow, sales reporting) over
//! axum, with structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod mailer;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post, put};
use domain::{
    AccountService, CartService, CatalogService, Mailer, OrderService, ReportService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store, M: Mailer> {
    pub accounts: AccountService<S>,
    pub catalog: CatalogService<S>,
    pub carts: CartService<S>,
    pub orders: OrderService<S, M>,
    pub reports: ReportService<S>,
    pub mailer: M,
    pub store: S,
    pub config: Config,
}

/// Wires the domain services over one store and mailer.
pub fn create_state<S: Store, M: Mailer + Clone + 'static>(
    store: S,
    mailer: M,
    config: Config,
) -> Arc<AppState<S, M>> {
    Arc::new(AppState {
        accounts: AccountService::new(store.clone()),
        catalog: CatalogService::new(store.clone()),
        carts: CartService::new(store.clone()),
        orders: OrderService::new(store.clone(), mailer.clone()),
        reports: ReportService::new(store.clone()),
        mailer,
        store,
        config,
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store, M: Mailer + 'static>(
    state: Arc<AppState<S, M>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/auth/signup", post(routes::auth::signup::<S, M>))
        .route("/api/auth/login", post(routes::auth::login::<S, M>))
        .route("/api/auth/profile", put(routes::auth::profile::<S, M>))
        .route("/api/products", get(routes::products::list::<S, M>))
        .route("/api/products/{id}", get(routes::products::get::<S, M>))
        .route("/api/cart", get(routes::cart::get::<S, M>))
        .route("/api/cart/add", post(routes::cart::add::<S, M>))
        .route("/api/cart/update", put(routes::cart::update::<S, M>))
        .route(
            "/api/cart/remove/{product_id}",
            delete(routes::cart::remove::<S, M>),
        )
        .route("/api/orders", post(routes::orders::create::<S, M>))
        .route("/api/orders", get(routes::orders::list::<S, M>))
        .route("/api/orders/{id}", get(routes::orders::get::<S, M>))
        .route("/api/admin/dashboard", get(routes::admin::dashboard::<S, M>))
        .route(
            "/api/admin/products",
            post(routes::admin::create_product::<S, M>),
        )
        .route(
            "/api/admin/products",
            get(routes::admin::list_products::<S, M>),
        )
        .route(
            "/api/admin/products/{id}",
            get(routes::admin::get_product::<S, M>),
        )
        .route(
            "/api/admin/products/{id}",
            put(routes::admin::update_product::<S, M>),
        )
        .route(
            "/api/admin/products/{id}",
            delete(routes::admin::delete_product::<S, M>),
        )
        .route("/api/admin/orders", get(routes::admin::list_orders::<S, M>))
        .route(
            "/api/admin/orders/{id}",
            get(routes::admin::get_order::<S, M>),
        )
        .route(
            "/api/admin/orders/{id}/status",
            patch(routes::admin::update_order_status::<S, M>),
        )
        .route("/api/admin/sales", get(routes::admin::sales::<S, M>))
        .route(
            "/api/contact/send-email",
            post(routes::contact::send_email::<S, M>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
