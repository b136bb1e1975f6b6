// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Store unavailable (circuit open)")]
    Unavailable,
    #[error("Key '{key}' holds a value of the wrong type")]
    WrongType { key: String },
}

/// Minimal key-value surface the cache needs from its backing store.
///
/// Keys passed here are already physical (namespaced). Implementations must
/// make `set_with_ttl` a single atomic command, never a SET followed by a
/// separate EXPIRE.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, expiring after `ttl_secs` (must be > 0).
    async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StorageError>;

    /// Non-blocking delete. Removing a missing key is not an error.
    async fn unlink(&self, key: &str) -> Result<(), StorageError>;

    /// Add `member` to the set at `key` and make sure the set lives at least
    /// `ttl_secs` from now. An existing longer expiry is kept.
    async fn set_add(&self, key: &str, member: &str, ttl_secs: u64) -> Result<(), StorageError>;

    /// Members of the set at `key`; empty when the key does not exist.
    async fn set_members(&self, key: &str) -> Result<Vec<String>, StorageError>;
}
