//! Redis cache backend.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tokio::time::timeout;

use crate::cache::{CacheError, KeyValueCache};
use crate::config::CacheConfig;

/// Redis-backed cache over a multiplexed, auto-reconnecting connection.
///
/// Every command is bounded by `op_timeout`; nothing is retried here.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    op_timeout: Duration,
}

impl RedisCache {
    /// Connects to the configured server and checks it answers PING.
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let op_timeout = Duration::from_millis(config.op_timeout_ms);
        let client = Client::open(connection_info(config)?)
            .map_err(|err| CacheError::Unavailable(err.to_string()))?;

        let conn = match timeout(op_timeout * 10, ConnectionManager::new(client)).await {
            Ok(conn) => conn.map_err(|err| CacheError::Unavailable(err.to_string()))?,
            Err(_) => return Err(CacheError::Timeout(op_timeout * 10)),
        };

        let cache = Self { conn, op_timeout };
        let mut conn = cache.conn.clone();
        let _: String = cache
            .bounded(redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(cache)
    }

    async fn bounded<T>(
        &self,
        command: impl Future<Output = redis::RedisResult<T>>,
    ) -> Result<T, CacheError> {
        match timeout(self.op_timeout, command).await {
            Ok(result) => result.map_err(|err| CacheError::Unavailable(err.to_string())),
            Err(_) => Err(CacheError::Timeout(self.op_timeout)),
        }
    }
}

fn connection_info(config: &CacheConfig) -> Result<ConnectionInfo, CacheError> {
    let (host, port) = parse_addr(&config.addr)?;
    let password = Some(config.password.clone()).filter(|p| !p.is_empty());

    Ok(ConnectionInfo {
        addr: ConnectionAddr::Tcp(host, port),
        redis: RedisConnectionInfo {
            db: config.db,
            password,
            ..Default::default()
        },
    })
}

fn parse_addr(addr: &str) -> Result<(String, u16), CacheError> {
    let invalid = || CacheError::Unavailable(format!("invalid redis address `{addr}`"));
    let (host, port) = addr.trim().rsplit_once(':').ok_or_else(invalid)?;
    if host.is_empty() {
        return Err(invalid());
    }
    let port = port.parse::<u16>().map_err(|_| invalid())?;
    Ok((host.to_string(), port))
}

#[async_trait]
impl KeyValueCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.get::<_, Option<String>>(key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        // EX rejects 0; sub-second TTLs round up to one second
        let seconds = ttl.as_secs().max(1);
        self.bounded(conn.set_ex::<_, _, ()>(key, value, seconds))
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.del::<_, ()>(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_addr() {
        assert_eq!(
            parse_addr("localhost:6379").unwrap(),
            ("localhost".to_string(), 6379)
        );
        assert_eq!(
            parse_addr(" cache.internal:6380 ").unwrap(),
            ("cache.internal".to_string(), 6380)
        );
    }

    #[test]
    fn test_parse_addr_rejects_malformed() {
        assert!(parse_addr("localhost").is_err());
        assert!(parse_addr(":6379").is_err());
        assert!(parse_addr("localhost:redis").is_err());
    }

    #[test]
    fn test_connection_info_from_config() {
        let config = CacheConfig {
            addr: "127.0.0.1:6379".to_string(),
            password: String::new(),
            db: 2,
            ..CacheConfig::default()
        };
        let info = connection_info(&config).unwrap();
        assert_eq!(info.redis.db, 2);
        assert!(info.redis.password.is_none());
        assert!(matches!(info.addr, ConnectionAddr::Tcp(ref host, 6379) if host == "127.0.0.1"));
    }
}
