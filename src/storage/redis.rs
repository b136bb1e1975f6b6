// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Redis backing store.
//!
//! Entries are plain Redis STRINGs written with `SET key value EX ttl`, so
//! the value and its expiry land in one atomic command. Deletes use `UNLINK`,
//! which reclaims memory off the main thread.
//!
//! The store-backed table index uses Redis SETs:
//! ```text
//! SADD   drizzle#table:users drizzle-key-1
//! EXPIRE drizzle#table:users 300 NX
//! EXPIRE drizzle#table:users 300 GT
//! ```
//! `EXPIRE ... NX|GT` requires Redis 7.0 or newer.
//!
//! Every call passes through a [`CircuitBreaker`]; nothing is retried once
//! the connection is up.

use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{cmd, pipe, AsyncCommands, Client, RedisError};

use super::traits::{KvStore, StorageError};
use crate::resilience::circuit_breaker::{CircuitBreaker, CircuitConfig, CircuitError};
use crate::resilience::retry::{retry, RetryConfig};

impl From<CircuitError<RedisError>> for StorageError {
    fn from(err: CircuitError<RedisError>) -> Self {
        match err {
            CircuitError::Rejected => StorageError::Unavailable,
            CircuitError::Inner(e) => StorageError::Backend(e.to_string()),
        }
    }
}

#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    circuit: Arc<CircuitBreaker>,
}

impl RedisStore {
    /// Connect with the default circuit breaker settings.
    pub async fn new(connection_string: &str) -> Result<Self, StorageError> {
        Self::with_circuit(connection_string, CircuitConfig::default()).await
    }

    /// Connect, failing fast (a handful of attempts) if Redis is unreachable.
    pub async fn with_circuit(connection_string: &str, circuit: CircuitConfig) -> Result<Self, StorageError> {
        let client = Client::open(connection_string).map_err(|e| StorageError::Backend(e.to_string()))?;

        let connection = retry("redis_connect", &RetryConfig::startup(), || async {
            ConnectionManager::new(client.clone()).await
        })
        .await
        .map_err(|e: RedisError| StorageError::Backend(e.to_string()))?;

        Ok(Self::from_connection(connection, circuit))
    }

    /// Wrap an existing connection (shared with the host application).
    pub fn from_connection(connection: ConnectionManager, circuit: CircuitConfig) -> Self {
        Self {
            connection,
            circuit: Arc::new(CircuitBreaker::new("redis_store", circuit)),
        }
    }

    pub fn connection(&self) -> ConnectionManager {
        self.connection.clone()
    }

    pub fn circuit(&self) -> &CircuitBreaker {
        &self.circuit
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.connection.clone();
        let value = self
            .circuit
            .call(|| async move {
                let value: Option<String> = conn.get(key).await?;
                Ok::<_, RedisError>(value)
            })
            .await?;
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StorageError> {
        let mut conn = self.connection.clone();
        self.circuit
            .call(|| async move {
                let _: () = cmd("SET")
                    .arg(key)
                    .arg(value)
                    .arg("EX")
                    .arg(ttl_secs)
                    .query_async(&mut conn)
                    .await?;
                Ok::<_, RedisError>(())
            })
            .await?;
        Ok(())
    }

    async fn unlink(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = self.connection.clone();
        self.circuit
            .call(|| async move {
                let _: i64 = cmd("UNLINK").arg(key).query_async(&mut conn).await?;
                Ok::<_, RedisError>(())
            })
            .await?;
        Ok(())
    }

    async fn set_add(&self, key: &str, member: &str, ttl_secs: u64) -> Result<(), StorageError> {
        let mut conn = self.connection.clone();
        self.circuit
            .call(|| async move {
                let mut pipeline = pipe();
                pipeline
                    .atomic()
                    .cmd("SADD").arg(key).arg(member).ignore()
                    .cmd("EXPIRE").arg(key).arg(ttl_secs).arg("NX").ignore()
                    .cmd("EXPIRE").arg(key).arg(ttl_secs).arg("GT").ignore();
                let _: () = pipeline.query_async(&mut conn).await?;
                Ok::<_, RedisError>(())
            })
            .await?;
        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StorageError> {
        let mut conn = self.connection.clone();
        let members = self
            .circuit
            .call(|| async move {
                let members: Vec<String> = conn.smembers(key).await?;
                Ok::<_, RedisError>(members)
            })
            .await?;
        Ok(members)
    }
}
