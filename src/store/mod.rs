//! Relational Store Module
//!
//! Row-level access to the `ads` table. The store knows nothing about caching.

mod memory;
mod mysql;

pub use memory::MemoryAdStore;
pub use mysql::MySqlAdStore;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Ad, AdDraft};

// == Store Error ==
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched the id, or zero rows were affected
    #[error("ad not found")]
    NotFound,

    /// Query or connection failure
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl StoreError {
    pub fn from_persistence(err: impl fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

// == Sort Column ==
/// Columns a listing may be ordered by.
///
/// Sort identifiers are interpolated into SQL text, so only these variants
/// can ever reach a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Title,
    Price,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortColumn {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::Title => "title",
            SortColumn::Price => "price",
            SortColumn::CreatedAt => "created_at",
            SortColumn::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "id" => Ok(SortColumn::Id),
            "title" => Ok(SortColumn::Title),
            "price" => Ok(SortColumn::Price),
            "created_at" => Ok(SortColumn::CreatedAt),
            "updated_at" => Ok(SortColumn::UpdatedAt),
            other => Err(format!("unsupported sort column `{other}`")),
        }
    }
}

// == Sort Order ==
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("asc") {
            Ok(SortOrder::Asc)
        } else if trimmed.eq_ignore_ascii_case("desc") {
            Ok(SortOrder::Desc)
        } else {
            Err(format!("unsupported sort order `{trimmed}`"))
        }
    }
}

// == List Params ==
/// Window and ordering of a listing query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    pub limit: u32,
    pub offset: u64,
    pub sort: SortColumn,
    pub order: SortOrder,
}

impl Default for ListParams {
    /// The landing page: 10 rows from offset 0, oldest first.
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
            sort: SortColumn::CreatedAt,
            order: SortOrder::Asc,
        }
    }
}

impl ListParams {
    /// True only for the exact default window, the one shape whose result is cached.
    pub fn is_default_page(&self) -> bool {
        *self == Self::default()
    }
}

// == Ad Store ==
/// Persistence capability for ads.
#[async_trait]
pub trait AdStore: Send + Sync {
    /// Lists one window of ads in the requested order.
    async fn list(&self, params: &ListParams) -> Result<Vec<Ad>, StoreError>;

    /// Counts all ads.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Fetches one ad, or `StoreError::NotFound`.
    async fn find(&self, id: i64) -> Result<Ad, StoreError>;

    /// Inserts a new ad and returns it with store-assigned id and timestamps.
    async fn insert(&self, draft: &AdDraft) -> Result<Ad, StoreError>;

    /// Overwrites all client fields of an ad and bumps `updated_at`.
    ///
    /// Returns `StoreError::NotFound` when no row was affected.
    async fn update(&self, id: i64, draft: &AdDraft) -> Result<(), StoreError>;

    /// Deletes an ad, or returns `StoreError::NotFound` when no row was affected.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}
