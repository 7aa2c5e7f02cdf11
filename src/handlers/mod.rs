pub mod admin;
pub mod api;
pub mod health;
pub mod metrics;
pub mod middleware;
pub mod recipes;
pub mod shopping_cart;
pub mod users;

pub use admin::*;
pub use api::*;
pub use health::*;
pub use metrics::*;
pub use middleware::*;

use axum::{middleware as axum_middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::observability::{observability_middleware, Metrics};

/// Full application router: health, metrics, public API and admin routes
pub fn create_app(
    metrics: Arc<Metrics>,
    api_state: ApiState,
    admin_router: Router,
    server: &ServerConfig,
) -> Router {
    let metrics_for_middleware = metrics.clone();

    Router::new()
        .route("/health/status", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
        .merge(create_api_router(api_state))
        .merge(admin_router)
        // Layers run outer to inner from the bottom up
        .layer(axum_middleware::from_fn(request_validation_middleware))
        .layer(RequestBodyLimitLayer::new(server.max_request_size))
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(axum_middleware::from_fn(cors_middleware))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}
