// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Table index: which cached results depend on which tables.
//!
//! ```text
//! users  → [q:users:list, q:users:by_id:7, q:posts_with_authors]
//! posts  → [q:posts_with_authors]
//! ```
//!
//! Two implementations:
//!
//! | Index               | Survives restart | Shared across processes |
//! |---------------------|------------------|-------------------------|
//! | [`MemoryTableIndex`]| no               | no                      |
//! | [`StoreTableIndex`] | yes              | yes                     |
//!
//! The in-memory index forgets everything on restart; entries cached before
//! the restart then stay readable until their TTL even if their tables are
//! mutated. The store-backed index closes that window at the cost of one
//! extra store round trip per table on `put` and `on_mutate`.

mod memory;
mod store;

pub use memory::MemoryTableIndex;
pub use store::StoreTableIndex;

use async_trait::async_trait;

use crate::storage::StorageError;

#[async_trait]
pub trait TableIndex: Send + Sync {
    /// Record that `key` depends on each of `tables`. Idempotent per
    /// (table, key). `ttl_secs` is the lifetime of the cached entry.
    async fn register(&self, key: &str, tables: &[String], ttl_secs: u64) -> Result<(), StorageError>;

    /// Keys currently tracked for `table`; empty if none.
    async fn keys_for(&self, table: &str) -> Result<Vec<String>, StorageError>;

    /// Forget every key tracked for `table`.
    async fn clear(&self, table: &str) -> Result<(), StorageError>;
}
