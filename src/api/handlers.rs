//! API Handlers
//!
//! Parse the request, call the service, shape the response. No business
//! rules live here.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{AppError, Result};
use crate::models::{Ad, AdPage, AdRequest, DeleteResponse, HealthResponse, ListAdsQuery};

use super::AppState;

fn parse_id(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::InvalidInput("invalid ad id".to_string()))
}

/// Handler for GET /ads
///
/// The query string is read as raw pairs so that repeated or malformed
/// parameters fall back instead of rejecting the request.
pub async fn list_ads_handler(
    State(state): State<AppState>,
    query: Option<Query<Vec<(String, String)>>>,
) -> Result<Json<AdPage>> {
    let pairs = query.map(|Query(pairs)| pairs).unwrap_or_default();
    let query = ListAdsQuery::from_pairs(pairs);
    let page = state.service.list_ads(query.into_params()).await?;
    Ok(Json(page))
}

/// Handler for GET /ads/:id
pub async fn get_ad_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Ad>> {
    let ad = state.service.get_ad(parse_id(&id)?).await?;
    Ok(Json(ad))
}

/// Handler for POST /ads
pub async fn create_ad_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AdRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Ad>)> {
    let Json(req) = payload?;
    let ad = state.service.create_ad(req.into()).await?;
    Ok((StatusCode::CREATED, Json(ad)))
}

/// Handler for PUT /ads/:id
pub async fn update_ad_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<AdRequest>, JsonRejection>,
) -> Result<Json<Ad>> {
    let id = parse_id(&id)?;
    let Json(req) = payload?;
    let ad = state.service.update_ad(id, req.into()).await?;
    Ok(Json(ad))
}

/// Handler for DELETE /ads/:id
pub async fn delete_ad_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.service.delete_ad(parse_id(&id)?).await?;
    Ok(Json(DeleteResponse::deleted()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id("-1").unwrap(), -1);
        assert!(matches!(parse_id("abc"), Err(AppError::InvalidInput(_))));
        assert!(matches!(parse_id("1.5"), Err(AppError::InvalidInput(_))));
        assert!(matches!(
            parse_id("99999999999999999999"),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
