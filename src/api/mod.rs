//! API Module
//!
//! HTTP handlers and routing for the ad REST API.
//!
//! # Endpoints
//! - `GET /ads` - List one page of ads
//! - `POST /ads` - Create an ad
//! - `GET /ads/:id` - Fetch one ad
//! - `PUT /ads/:id` - Replace an ad
//! - `DELETE /ads/:id` - Delete an ad
//! - `GET /health` - Liveness
//! - `GET /metrics` - Prometheus exposition

pub mod handlers;
mod middleware;
pub mod routes;

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::metrics::Metrics;
use crate::service::AdService;

pub use routes::create_router;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn AdService>,
    pub metrics: Metrics,
    /// Renderer for `/metrics`; absent when no Prometheus recorder was built
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(service: Arc<dyn AdService>, metrics: Metrics) -> Self {
        Self {
            service,
            metrics,
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}
