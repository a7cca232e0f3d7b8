//! HTTP API server with observability for the credit core.
//!
//! Provides REST endpoints for purchases, purchase history, and limit
//! adjustments, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use credit_store::{AssetCatalog, CreditStore, InMemoryAssetCatalog, InMemoryCreditStore};
use domain::CreditService;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::purchases::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: CreditStore + 'static, A: AssetCatalog + 'static>(
    state: Arc<AppState<S, A>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/consumers/{id}/purchases",
            post(routes::purchases::create::<S, A>),
        )
        .route(
            "/consumers/{id}/purchases",
            get(routes::purchases::list::<S, A>),
        )
        .route(
            "/consumers/{id}/limits/{tenor}/adjustments",
            post(routes::limits::adjust::<S, A>),
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

/// Creates application state over the in-memory store and catalog.
///
/// Used when no `DATABASE_URL` is configured, and by tests.
pub fn create_in_memory_state() -> Arc<AppState<InMemoryCreditStore, InMemoryAssetCatalog>> {
    Arc::new(AppState {
        credit_service: CreditService::new(InMemoryCreditStore::new(), InMemoryAssetCatalog::new()),
    })
}
