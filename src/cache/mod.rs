//! Cache Module
//!
//! Key-value cache capability used by the repository's cache-aside protocol,
//! with a Redis backend and an in-process backend (TTL expiration, LRU eviction).

mod entry;
mod lru;
mod memory;
mod redis_cache;
mod store;


use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use memory::MemoryCache;
pub use redis_cache::RedisCache;
pub use store::CacheStore;

// == Public Constants ==
/// Key under which the default landing page of ads is cached
pub const DEFAULT_PAGE_KEY: &str = "ads:default_page";

/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

/// Per-entity cache key for an ad.
pub fn ad_key(id: i64) -> String {
    format!("ad:{id}")
}

// == Cache Error ==
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend unreachable or command failed
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// Backend did not answer within the operation timeout
    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),

    /// Entry refused by backend limits
    #[error("cache entry rejected: {0}")]
    Rejected(String),
}

// == Key Value Cache ==
/// A string cache with per-key expiration.
///
/// Every operation is best-effort from the caller's point of view: an error
/// is equivalent to a miss and must never fail the surrounding request.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Returns the value stored under `key`, or `None` on a miss.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key` for `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Removes `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
