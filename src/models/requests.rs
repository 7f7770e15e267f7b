//! Request DTOs for the ad API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::models::AdDraft;
use crate::store::{ListParams, SortColumn, SortOrder};

/// Page size used when `limit` is absent or invalid.
pub const DEFAULT_LIMIT: u32 = 10;

/// Request body for POST /ads and PUT /ads/:id
///
/// `active` defaults to true when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct AdRequest {
    pub title: String,
    pub description: String,
    pub price: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl From<AdRequest> for AdDraft {
    fn from(req: AdRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            price: req.price,
            active: req.active,
        }
    }
}

/// Query string for GET /ads
///
/// Every field is kept raw so that malformed values fall back to defaults
/// instead of rejecting the request.
#[derive(Debug, Clone, Default)]
pub struct ListAdsQuery {
    pub limit: Option<String>,
    pub page: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl ListAdsQuery {
    /// Collects raw query pairs. The first occurrence of a key wins and
    /// unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "limit" => &mut query.limit,
                "page" => &mut query.page,
                "sortBy" => &mut query.sort_by,
                "order" => &mut query.order,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }

    /// Resolves the query into store-level list parameters.
    ///
    /// - `limit`: positive integer, otherwise 10
    /// - `page`: positive integer, otherwise 1
    /// - `sortBy`: allow-listed column, otherwise `created_at`
    /// - `order`: `asc`/`desc` in any case, otherwise `ASC`
    pub fn into_params(self) -> ListParams {
        let limit = self
            .limit
            .as_deref()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_LIMIT);

        let page = self
            .page
            .as_deref()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(1);

        let sort = self
            .sort_by
            .as_deref()
            .and_then(|v| v.parse::<SortColumn>().ok())
            .unwrap_or_default();

        let order = self
            .order
            .as_deref()
            .and_then(|v| v.parse::<SortOrder>().ok())
            .unwrap_or_default();

        ListParams {
            limit,
            offset: (page - 1).saturating_mul(u64::from(limit)),
            sort,
            order,
        }
    }
}
