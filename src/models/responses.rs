//! Response DTOs for the ad API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::models::Ad;
use crate::pagination::PageInfo;

/// Response body for GET /ads
///
/// `next_page` and `prev_page` are omitted at the boundaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdPage {
    pub ads: Vec<Ad>,
    pub current_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_page: Option<u64>,
    pub total_pages: u64,
}

impl AdPage {
    pub fn new(ads: Vec<Ad>, info: PageInfo) -> Self {
        Self {
            ads,
            current_page: info.current_page,
            next_page: info.next_page,
            prev_page: info.prev_page,
            total_pages: info.total_pages,
        }
    }
}

/// Response body for DELETE /ads/:id
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

impl DeleteResponse {
    pub fn deleted() -> Self {
        Self {
            message: "ad deleted successfully".to_string(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
