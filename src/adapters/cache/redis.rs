//! Redis-backed payment view cache.
//!
//! Views are stored as JSON with `SET key value EX ttl`. Invalidation is a
//! single `DEL` over both keys.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::time::Duration;

use crate::domain::foundation::{DomainError, ErrorCode, PaymentId};
use crate::ports::{PaymentCache, PaymentCacheKey, PaymentView};

#[derive(Clone)]
pub struct RedisPaymentCache {
    conn: MultiplexedConnection,
    key_prefix: String,
    ttl: Duration,
}

impl RedisPaymentCache {
    pub fn new(conn: MultiplexedConnection, key_prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
            ttl,
        }
    }

    /// Opens a multiplexed connection.
    pub async fn connect(url: &str, key_prefix: impl Into<String>, ttl: Duration) -> Result<Self, DomainError> {
        let client = redis::Client::open(url).map_err(cache_error)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(cache_error)?;
        Ok(Self::new(conn, key_prefix, ttl))
    }

    fn key(&self, key: &PaymentCacheKey) -> String {
        prefixed(&self.key_prefix, key)
    }
}

fn prefixed(prefix: &str, key: &PaymentCacheKey) -> String {
    if prefix.is_empty() {
        key.as_storage_key()
    } else {
        format!("{}:{}", prefix, key.as_storage_key())
    }
}

fn cache_error(err: redis::RedisError) -> DomainError {
    DomainError::new(ErrorCode::CacheError, format!("Redis error: {}", err))
}

#[async_trait]
impl PaymentCache for RedisPaymentCache {
    async fn get(&self, key: &PaymentCacheKey) -> Result<Option<PaymentView>, DomainError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(self.key(key))
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;

        match raw {
            None => Ok(None),
            Some(json) => serde_json::from_str(&json).map(Some).map_err(|e| {
                DomainError::new(ErrorCode::CacheError, format!("Corrupt cached payment view: {}", e))
            }),
        }
    }

    async fn put(&self, view: &PaymentView) -> Result<(), DomainError> {
        let json = serde_json::to_string(view).map_err(|e| {
            DomainError::new(ErrorCode::CacheError, format!("Failed to encode payment view: {}", e))
        })?;
        let ttl_secs = self.ttl.as_secs().max(1);

        let mut keys = vec![self.key(&PaymentCacheKey::Id(view.id))];
        if let Some(txn) = &view.transaction_id {
            keys.push(self.key(&PaymentCacheKey::Transaction(txn.clone())));
        }

        let mut pipe = redis::pipe();
        for key in &keys {
            pipe.cmd("SET").arg(key).arg(&json).arg("EX").arg(ttl_secs).ignore();
        }

        let mut conn = self.conn.clone();
        pipe.query_async::<_, ()>(&mut conn).await.map_err(cache_error)
    }

    async fn invalidate(&self, payment_id: PaymentId, transaction_id: Option<&str>) -> Result<(), DomainError> {
        let mut keys = vec![self.key(&PaymentCacheKey::Id(payment_id))];
        if let Some(txn) = transaction_id {
            keys.push(self.key(&PaymentCacheKey::Transaction(txn.to_string())));
        }

        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(keys)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(cache_error)
    }
}
