//! Test doubles for the store and cache capabilities.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{CacheError, KeyValueCache, MemoryCache};
use crate::models::{Ad, AdDraft};
use crate::store::{AdStore, ListParams, MemoryAdStore, StoreError};

/// Wraps [`MemoryAdStore`] and counts every call.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryAdStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Inserts directly, bypassing the counter.
    pub async fn seed(&self, title: &str, price: f64) -> Ad {
        self.inner
            .insert(&AdDraft::new(title, "seeded", price))
            .await
            .unwrap()
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AdStore for CountingStore {
    async fn list(&self, params: &ListParams) -> Result<Vec<Ad>, StoreError> {
        self.hit();
        self.inner.list(params).await
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.hit();
        self.inner.count().await
    }

    async fn find(&self, id: i64) -> Result<Ad, StoreError> {
        self.hit();
        self.inner.find(id).await
    }

    async fn insert(&self, draft: &AdDraft) -> Result<Ad, StoreError> {
        self.hit();
        self.inner.insert(draft).await
    }

    async fn update(&self, id: i64, draft: &AdDraft) -> Result<(), StoreError> {
        self.hit();
        self.inner.update(id, draft).await
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.hit();
        self.inner.delete(id).await
    }
}

/// A store whose every call fails with a persistence error.
#[derive(Debug, Default)]
pub struct BrokenStore;

#[async_trait]
impl AdStore for BrokenStore {
    async fn list(&self, _params: &ListParams) -> Result<Vec<Ad>, StoreError> {
        Err(StoreError::from_persistence("connection refused"))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Err(StoreError::from_persistence("connection refused"))
    }

    async fn find(&self, _id: i64) -> Result<Ad, StoreError> {
        Err(StoreError::from_persistence("connection refused"))
    }

    async fn insert(&self, _draft: &AdDraft) -> Result<Ad, StoreError> {
        Err(StoreError::from_persistence("connection refused"))
    }

    async fn update(&self, _id: i64, _draft: &AdDraft) -> Result<(), StoreError> {
        Err(StoreError::from_persistence("connection refused"))
    }

    async fn delete(&self, _id: i64) -> Result<(), StoreError> {
        Err(StoreError::from_persistence("connection refused"))
    }
}

/// Cache operation observed by [`RecordingCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheCall {
    Get(String),
    Set(String, Duration),
    Delete(String),
}

/// Wraps [`MemoryCache`] and logs every call with its key.
#[derive(Debug)]
pub struct RecordingCache {
    inner: MemoryCache,
    calls: Mutex<Vec<CacheCall>>,
}

impl RecordingCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryCache::new(1_000),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<CacheCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that touched `key`.
    pub fn calls_for(&self, key: &str) -> Vec<CacheCall> {
        self.calls()
            .into_iter()
            .filter(|call| match call {
                CacheCall::Get(k) | CacheCall::Set(k, _) | CacheCall::Delete(k) => k == key,
            })
            .collect()
    }

    /// Reads the raw entry without recording a call.
    pub async fn peek(&self, key: &str) -> Option<String> {
        self.inner.get(key).await.unwrap()
    }

    /// Writes a raw entry without recording a call.
    pub async fn plant(&self, key: &str, value: &str) {
        self.inner
            .set(key, value, Duration::from_secs(600))
            .await
            .unwrap();
    }

    fn record(&self, call: CacheCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl KeyValueCache for RecordingCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.record(CacheCall::Get(key.to_string()));
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.record(CacheCall::Set(key.to_string(), ttl));
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.record(CacheCall::Delete(key.to_string()));
        self.inner.delete(key).await
    }
}

/// A cache whose backend is always unreachable.
#[derive(Debug, Default)]
pub struct UnreachableCache;

#[async_trait]
impl KeyValueCache for UnreachableCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Timeout(Duration::from_millis(100)))
    }
}
