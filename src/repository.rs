//! Ad Repository Module
//!
//! Cache-aside access to ads. The cache is consulted first for single-ad reads
//! and the default landing page, and the store stays authoritative: cache
//! failures only ever degrade to a miss.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::field::Empty;
use tracing::{debug, instrument, warn};

use crate::cache::{ad_key, CacheError, KeyValueCache, DEFAULT_PAGE_KEY};
use crate::metrics::{Classify, Layer, Metrics, Outcome};
use crate::models::{Ad, AdDraft};
use crate::store::{AdStore, ListParams, StoreError};

impl Classify for StoreError {
    fn outcome(&self) -> Outcome {
        match self {
            StoreError::NotFound => Outcome::NotFound,
            StoreError::Persistence(_) => Outcome::Error,
        }
    }
}

// == Ad Repository ==
#[async_trait]
pub trait AdRepository: Send + Sync {
    async fn get_all_ads(&self, params: &ListParams) -> Result<Vec<Ad>, StoreError>;

    async fn count_ads(&self) -> Result<u64, StoreError>;

    async fn get_ad_by_id(&self, id: i64) -> Result<Ad, StoreError>;

    async fn create_ad(&self, draft: &AdDraft) -> Result<Ad, StoreError>;

    async fn update_ad(&self, id: i64, draft: &AdDraft) -> Result<Ad, StoreError>;

    async fn delete_ad(&self, id: i64) -> Result<(), StoreError>;
}

/// [`AdRepository`] over a store and a key-value cache.
pub struct CachedAdRepository {
    store: Arc<dyn AdStore>,
    cache: Arc<dyn KeyValueCache>,
    metrics: Metrics,
    ttl: Duration,
}

impl CachedAdRepository {
    pub fn new(
        store: Arc<dyn AdStore>,
        cache: Arc<dyn KeyValueCache>,
        metrics: Metrics,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            metrics,
            ttl,
        }
    }

    /// Reads and decodes `key`. Errors and undecodable values count as misses.
    async fn read_cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    self.metrics.record_cache_lookup(key, "hit");
                    debug!(key, "cache hit");
                    Some(value)
                }
                Err(err) => {
                    self.metrics.record_cache_lookup(key, "miss");
                    warn!(key, error = %err, "discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => {
                self.metrics.record_cache_lookup(key, "miss");
                debug!(key, "cache miss");
                None
            }
            Err(err) => {
                self.metrics.record_cache_lookup(key, "error");
                warn!(key, error = %err, "cache read failed, falling back to store");
                None
            }
        }
    }

    async fn populate<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                self.metrics.record_cache_write_failure(key, "serialize");
                warn!(key, error = %err, "failed to serialize cache value");
                return;
            }
        };
        let result = self.cache.set(key, &raw, self.ttl).await;
        self.best_effort(key, "set", result);
    }

    async fn invalidate(&self, key: &str) {
        let result = self.cache.delete(key).await;
        self.best_effort(key, "delete", result);
    }

    /// Absorbs the result of a cache write: logged and counted, never returned.
    fn best_effort(&self, key: &str, action: &'static str, result: Result<(), CacheError>) {
        if let Err(err) = result {
            self.metrics.record_cache_write_failure(key, action);
            warn!(key, action, error = %err, "best-effort cache write failed");
        }
    }

    async fn load_page(&self, params: &ListParams) -> Result<Vec<Ad>, StoreError> {
        if !params.is_default_page() {
            return self.store.list(params).await;
        }

        if let Some(ads) = self.read_cached::<Vec<Ad>>(DEFAULT_PAGE_KEY).await {
            return Ok(ads);
        }
        let ads = self.store.list(params).await?;
        self.populate(DEFAULT_PAGE_KEY, &ads).await;
        Ok(ads)
    }

    async fn load_ad(&self, id: i64) -> Result<Ad, StoreError> {
        let key = ad_key(id);
        if let Some(ad) = self.read_cached::<Ad>(&key).await {
            return Ok(ad);
        }
        let ad = self.store.find(id).await?;
        self.populate(&key, &ad).await;
        Ok(ad)
    }

    async fn apply_update(&self, id: i64, draft: &AdDraft) -> Result<Ad, StoreError> {
        self.store.update(id, draft).await?;

        let key = ad_key(id);
        self.invalidate(&key).await;
        let ad = self.store.find(id).await?;
        self.populate(&key, &ad).await;
        Ok(ad)
    }

    async fn apply_delete(&self, id: i64) -> Result<(), StoreError> {
        self.store.delete(id).await?;
        self.invalidate(&ad_key(id)).await;
        Ok(())
    }
}

#[async_trait]
impl AdRepository for CachedAdRepository {
    #[instrument(
        name = "repository.get_all_ads",
        skip(self, params),
        fields(
            limit = params.limit,
            offset = params.offset,
            sort_by = params.sort.as_sql(),
            order = params.order.as_sql(),
            outcome = Empty,
            error = Empty
        )
    )]
    async fn get_all_ads(&self, params: &ListParams) -> Result<Vec<Ad>, StoreError> {
        let timer = self.metrics.start(Layer::Repository, "get_all_ads");
        let result = self.load_page(params).await;
        timer.finish(&result);
        result
    }

    #[instrument(
        name = "repository.count_ads",
        skip(self),
        fields(outcome = Empty, error = Empty)
    )]
    async fn count_ads(&self) -> Result<u64, StoreError> {
        let timer = self.metrics.start(Layer::Repository, "count_ads");
        let result = self.store.count().await;
        timer.finish(&result);
        result
    }

    #[instrument(
        name = "repository.get_ad_by_id",
        skip(self),
        fields(outcome = Empty, error = Empty)
    )]
    async fn get_ad_by_id(&self, id: i64) -> Result<Ad, StoreError> {
        let timer = self.metrics.start(Layer::Repository, "get_ad_by_id");
        let result = self.load_ad(id).await;
        timer.finish(&result);
        result
    }

    #[instrument(
        name = "repository.create_ad",
        skip(self, draft),
        fields(outcome = Empty, error = Empty)
    )]
    async fn create_ad(&self, draft: &AdDraft) -> Result<Ad, StoreError> {
        let timer = self.metrics.start(Layer::Repository, "create_ad");
        let result = self.store.insert(draft).await;
        timer.finish(&result);
        result
    }

    #[instrument(
        name = "repository.update_ad",
        skip(self, draft),
        fields(outcome = Empty, error = Empty)
    )]
    async fn update_ad(&self, id: i64, draft: &AdDraft) -> Result<Ad, StoreError> {
        let timer = self.metrics.start(Layer::Repository, "update_ad");
        let result = self.apply_update(id, draft).await;
        timer.finish(&result);
        result
    }

    #[instrument(
        name = "repository.delete_ad",
        skip(self),
        fields(outcome = Empty, error = Empty)
    )]
    async fn delete_ad(&self, id: i64) -> Result<(), StoreError> {
        let timer = self.metrics.start(Layer::Repository, "delete_ad");
        let result = self.apply_delete(id).await;
        timer.finish(&result);
        result
    }
}
