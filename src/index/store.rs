// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::sync::Arc;

use async_trait::async_trait;

use super::TableIndex;
use crate::storage::{KvStore, StorageError};

/// Table index persisted next to the cached entries.
///
/// Each table is a store set at `<namespace>#table:<table>`. Cached entries
/// always live at `<namespace>:<key>`, so no host key can land on an index
/// set. The set's expiry is pushed out to the longest TTL of any key added
/// to it, so a table that is never mutated doesn't keep an index forever.
pub struct StoreTableIndex<S: KvStore> {
    store: Arc<S>,
    namespace: String,
}

impl<S: KvStore> StoreTableIndex<S> {
    pub fn new(store: Arc<S>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    #[inline]
    fn table_key(&self, table: &str) -> String {
        format!("{}#table:{}", self.namespace, table)
    }
}

#[async_trait]
impl<S: KvStore> TableIndex for StoreTableIndex<S> {
    async fn register(&self, key: &str, tables: &[String], ttl_secs: u64) -> Result<(), StorageError> {
        // A zero TTL would make the set expire immediately
        let ttl_secs = ttl_secs.max(1);
        for table in tables {
            self.store.set_add(&self.table_key(table), key, ttl_secs).await?;
        }
        Ok(())
    }

    async fn keys_for(&self, table: &str) -> Result<Vec<String>, StorageError> {
        self.store.set_members(&self.table_key(table)).await
    }

    async fn clear(&self, table: &str) -> Result<(), StorageError> {
        self.store.unlink(&self.table_key(table)).await
    }
}
