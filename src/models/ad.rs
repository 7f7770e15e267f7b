//! Ad entity
//!
//! The single resource managed by the service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Ad ==
/// A classified ad as persisted by the store.
///
/// `id`, `created_at` and `updated_at` are always assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ad {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub active: bool,
}

// == Ad Draft ==
/// Client-controlled fields of an ad, used for inserts and full updates.
#[derive(Debug, Clone, PartialEq)]
pub struct AdDraft {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub active: bool,
}

impl AdDraft {
    /// Creates an active draft.
    pub fn new(title: impl Into<String>, description: impl Into<String>, price: f64) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            price,
            active: true,
        }
    }

    /// Returns a description of the first invalid field, if any.
    ///
    /// Negative prices are accepted.
    pub fn validate(&self) -> Option<String> {
        if self.title.trim().is_empty() {
            return Some("title cannot be empty".to_string());
        }
        if self.description.trim().is_empty() {
            return Some("description cannot be empty".to_string());
        }
        if !self.price.is_finite() {
            return Some("price must be a finite number".to_string());
        }
        None
    }
}
