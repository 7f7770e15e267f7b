use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::metrics::Metrics;

/// Records `handler_requests_total` and `handler_request_duration_seconds`
/// for every routed request, labelled by the route template.
pub async fn track_metrics(State(metrics): State<Metrics>, req: Request, next: Next) -> Response {
    let start = Instant::now();

    let endpoint = match req.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_owned(),
        None => req.uri().path().to_owned(),
    };
    let method = req.method().clone();

    let response = next.run(req).await;

    metrics.record_request(
        method.as_str(),
        &endpoint,
        response.status().as_u16(),
        start.elapsed(),
    );
    response
}
