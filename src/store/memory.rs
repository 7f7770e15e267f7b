//! In-memory ad store.
//!
//! Mirrors the MySQL store's semantics for local runs and tests: ids are
//! assigned monotonically and timestamps are owned by the store.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::models::{Ad, AdDraft};

use super::{AdStore, ListParams, SortColumn, SortOrder, StoreError};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, Ad>,
    last_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryAdStore {
    table: Mutex<Table>,
}

impl MemoryAdStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Table>, StoreError> {
        self.table
            .lock()
            .map_err(|_| StoreError::from_persistence("in-memory table lock poisoned"))
    }
}

fn compare(a: &Ad, b: &Ad, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Id => a.id.cmp(&b.id),
        SortColumn::Title => a.title.cmp(&b.title),
        SortColumn::Price => a.price.total_cmp(&b.price),
        SortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
        SortColumn::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    }
}

#[async_trait]
impl AdStore for MemoryAdStore {
    async fn list(&self, params: &ListParams) -> Result<Vec<Ad>, StoreError> {
        let table = self.lock()?;
        let mut ads: Vec<Ad> = table.rows.values().cloned().collect();
        ads.sort_by(|a, b| {
            let ordering = compare(a, b, params.sort).then_with(|| a.id.cmp(&b.id));
            match params.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let offset = usize::try_from(params.offset).unwrap_or(usize::MAX);
        Ok(ads
            .into_iter()
            .skip(offset)
            .take(params.limit as usize)
            .collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.rows.len() as u64)
    }

    async fn find(&self, id: i64) -> Result<Ad, StoreError> {
        self.lock()?.rows.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn insert(&self, draft: &AdDraft) -> Result<Ad, StoreError> {
        let mut table = self.lock()?;
        table.last_id += 1;
        let now = Utc::now();
        let ad = Ad {
            id: table.last_id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            price: draft.price,
            created_at: now,
            updated_at: now,
            active: draft.active,
        };
        table.rows.insert(ad.id, ad.clone());
        Ok(ad)
    }

    async fn update(&self, id: i64, draft: &AdDraft) -> Result<(), StoreError> {
        let mut table = self.lock()?;
        let ad = table.rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        ad.title = draft.title.clone();
        ad.description = draft.description.clone();
        ad.price = draft.price;
        ad.active = draft.active;
        // updated_at strictly advances even when two writes share a clock tick
        ad.updated_at = Utc::now().max(ad.updated_at + Duration::microseconds(1));
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.lock()?
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}
