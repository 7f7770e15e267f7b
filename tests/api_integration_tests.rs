//! Integration Tests for API Endpoints
//!
//! Drives the full router over the in-memory store and cache backends.

use std::sync::Arc;
use std::time::Duration;

use ad_service::cache::MemoryCache;
use ad_service::metrics::Metrics;
use ad_service::store::MemoryAdStore;
use ad_service::{create_router, AdServiceImpl, AppState, CachedAdRepository};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    let (metrics, handle) = Metrics::prometheus().unwrap();
    let repository = CachedAdRepository::new(
        Arc::new(MemoryAdStore::new()),
        Arc::new(MemoryCache::new(1_000)),
        metrics.clone(),
        Duration::from_secs(600),
    );
    let service = AdServiceImpl::new(Arc::new(repository), metrics.clone());
    let state = AppState::new(Arc::new(service), metrics).with_prometheus(handle);
    create_router(state, Duration::from_secs(5))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn timestamp(value: &Value) -> DateTime<Utc> {
    value.as_str().unwrap().parse().unwrap()
}

// == Lifecycle ==

#[tokio::test]
async fn test_ad_lifecycle() {
    let app = create_test_app();

    let (status, created) = send(
        &app,
        "POST",
        "/ads",
        Some(json!({"title": "Bike", "description": "Used", "price": 50.0})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();
    assert!(id > 0);
    assert_eq!(created["active"], true);
    assert!(created["created_at"].is_string());
    assert!(created["updated_at"].is_string());

    let (status, fetched) = send(&app, "GET", &format!("/ads/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/ads/{id}"),
        Some(json!({"title": "Bike", "description": "Used", "price": 40.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["price"], 40.0);
    assert_eq!(updated["created_at"], created["created_at"]);
    assert!(timestamp(&updated["updated_at"]) > timestamp(&created["updated_at"]));

    let (status, refetched) = send(&app, "GET", &format!("/ads/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refetched, updated);

    let (status, deleted) = send(&app, "DELETE", &format!("/ads/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["message"], "ad deleted successfully");

    let (status, missing) = send(&app, "GET", &format!("/ads/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(missing["error"].is_string());
}

#[tokio::test]
async fn test_inactive_flag_is_kept() {
    let app = create_test_app();

    let (status, created) = send(
        &app,
        "POST",
        "/ads",
        Some(json!({"title": "Sofa", "description": "Grey", "price": 120.0, "active": false})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["active"], false);
}

// == Validation ==

#[tokio::test]
async fn test_invalid_ids_are_bad_requests() {
    let app = create_test_app();

    for uri in ["/ads/0", "/ads/-3", "/ads/abc"] {
        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "GET {uri}");
        assert!(body["error"].is_string());

        let (status, _) = send(&app, "DELETE", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "DELETE {uri}");
    }
}

#[tokio::test]
async fn test_malformed_bodies_are_bad_requests() {
    let app = create_test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/ads")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_to_json(response.into_body()).await["error"].is_string());

    let (status, _) = send(&app, "POST", "/ads", Some(json!({"title": "Bike"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/ads",
        Some(json!({"title": "  ", "description": "Used", "price": 5.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "title cannot be empty");
}

#[tokio::test]
async fn test_update_unknown_ad_is_not_found() {
    let app = create_test_app();

    let (status, _) = send(
        &app,
        "PUT",
        "/ads/404",
        Some(json!({"title": "Bike", "description": "Used", "price": 1.0})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/ads/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// == Listing ==

#[tokio::test]
async fn test_list_pagination() {
    let app = create_test_app();
    for i in 0..25 {
        let (status, _) = send(
            &app,
            "POST",
            "/ads",
            Some(json!({"title": format!("ad {i}"), "description": "d", "price": i})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, first) = send(&app, "GET", "/ads", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["ads"].as_array().unwrap().len(), 10);
    assert_eq!(first["current_page"], 1);
    assert_eq!(first["next_page"], 2);
    assert!(first.get("prev_page").is_none());
    assert_eq!(first["total_pages"], 3);

    let (_, last) = send(&app, "GET", "/ads?page=3", None).await;
    assert_eq!(last["ads"].as_array().unwrap().len(), 5);
    assert_eq!(last["current_page"], 3);
    assert_eq!(last["prev_page"], 2);
    assert!(last.get("next_page").is_none());
}

#[tokio::test]
async fn test_list_sorting_and_fallbacks() {
    let app = create_test_app();
    for price in [30.0, 10.0, 20.0] {
        send(
            &app,
            "POST",
            "/ads",
            Some(json!({"title": "t", "description": "d", "price": price})),
        )
        .await;
    }

    let (_, sorted) = send(&app, "GET", "/ads?sortBy=price&order=desc", None).await;
    let prices: Vec<f64> = sorted["ads"]
        .as_array()
        .unwrap()
        .iter()
        .map(|ad| ad["price"].as_f64().unwrap())
        .collect();
    assert_eq!(prices, vec![30.0, 20.0, 10.0]);

    let (status, fallback) = send(
        &app,
        "GET",
        "/ads?limit=abc&page=-2&sortBy=price%3BDROP%20TABLE%20ads&order=sideways",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fallback["current_page"], 1);
    assert_eq!(fallback["ads"].as_array().unwrap().len(), 3);
    assert_eq!(fallback["ads"][0]["price"], 30.0);
}

#[tokio::test]
async fn test_list_repeated_param_uses_first_value() {
    let app = create_test_app();
    for i in 0..7 {
        send(
            &app,
            "POST",
            "/ads",
            Some(json!({"title": format!("ad {i}"), "description": "d", "price": i})),
        )
        .await;
    }

    let (status, page) = send(&app, "GET", "/ads?limit=5&limit=6", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["ads"].as_array().unwrap().len(), 5);
    assert_eq!(page["total_pages"], 2);

    let (status, page) = send(&app, "GET", "/ads?limit=2&page=2&page=9", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["current_page"], 2);
    assert_eq!(page["ads"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_default_page_is_served_from_cache_until_expiry() {
    let app = create_test_app();
    send(
        &app,
        "POST",
        "/ads",
        Some(json!({"title": "first", "description": "d", "price": 1.0})),
    )
    .await;

    let (_, before) = send(&app, "GET", "/ads", None).await;
    assert_eq!(before["ads"].as_array().unwrap().len(), 1);

    send(
        &app,
        "POST",
        "/ads",
        Some(json!({"title": "second", "description": "d", "price": 2.0})),
    )
    .await;

    // Creation leaves the cached landing page in place; other windows are live.
    let (_, cached) = send(&app, "GET", "/ads", None).await;
    assert_eq!(cached["ads"].as_array().unwrap().len(), 1);
    let (_, live) = send(&app, "GET", "/ads?limit=5", None).await;
    assert_eq!(live["ads"].as_array().unwrap().len(), 2);
}

// == Operational Endpoints ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = create_test_app();
    send(&app, "GET", "/ads/1", None).await;

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("service_methods_total"));
    assert!(text.contains("repository_queries_total"));
    assert!(text.contains("cache_lookups_total"));
}
