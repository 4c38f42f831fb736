//! HTTP API server for the LocalStore backend.
//!
//! Provides REST endpoints for the catalog, orders, payments and reviews,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod seed;
pub mod state;
pub mod views;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::PaymentGateway;
use metrics_exporter_prometheus::PrometheusHandle;
use storage::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, P>(state: Arc<AppState<S, P>>, metrics_handle: PrometheusHandle) -> Router
where
    S: Store + Clone + 'static,
    P: PaymentGateway + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let api = Router::new()
        .route(
            "/products",
            get(routes::products::list::<S, P>).post(routes::products::create::<S, P>),
        )
        .route(
            "/products/{id}",
            get(routes::products::get::<S, P>)
                .put(routes::products::update::<S, P>)
                .delete(routes::products::delete::<S, P>),
        )
        .route(
            "/products/{id}/reviews",
            get(routes::reviews::list::<S, P>).post(routes::reviews::create::<S, P>),
        )
        .route(
            "/orders",
            get(routes::orders::list::<S, P>).post(routes::orders::create::<S, P>),
        )
        .route("/orders/{id}", get(routes::orders::get::<S, P>))
        .route("/orders/{id}/track", get(routes::orders::track::<S, P>))
        .route("/payments/simulate", post(routes::payments::simulate::<S, P>))
        .route("/categories", get(routes::categories::list::<S, P>))
        .route("/health", get(routes::health::check));

    Router::new()
        .route("/", get(routes::root::index))
        .nest("/api", api)
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
