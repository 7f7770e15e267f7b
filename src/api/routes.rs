//! API Routes
//!
//! Configures the Axum router with the ad endpoints and middleware.

use std::time::Duration;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::handlers::{
    create_ad_handler, delete_ad_handler, get_ad_handler, health_handler, list_ads_handler,
    metrics_handler, update_ad_handler,
};
use super::middleware::track_metrics;
use super::AppState;

/// Creates the main router.
///
/// Requests exceeding `request_timeout` are answered with 408; dropping the
/// handler future cancels its in-flight store and cache calls.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ads", get(list_ads_handler).post(create_ad_handler))
        .route(
            "/ads/:id",
            get(get_ad_handler)
                .put(update_ad_handler)
                .delete(delete_ad_handler),
        )
        .route_layer(from_fn_with_state(state.metrics.clone(), track_metrics))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
