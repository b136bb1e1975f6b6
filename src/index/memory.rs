// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;
use dashmap::DashMap;

use super::TableIndex;
use crate::storage::StorageError;

/// Process-local table index.
///
/// Each table's key list is mutated under its DashMap shard lock, so
/// concurrent `register` calls never lose or duplicate a key.
#[derive(Debug, Default)]
pub struct MemoryTableIndex {
    tables: DashMap<String, Vec<String>>,
}

impl MemoryTableIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tables with an entry (cleared tables count, with zero keys).
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

#[async_trait]
impl TableIndex for MemoryTableIndex {
    async fn register(&self, key: &str, tables: &[String], _ttl_secs: u64) -> Result<(), StorageError> {
        for table in tables {
            let mut keys = self.tables.entry(table.clone()).or_default();
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
        Ok(())
    }

    async fn keys_for(&self, table: &str) -> Result<Vec<String>, StorageError> {
        Ok(self.tables.get(table).map(|keys| keys.value().clone()).unwrap_or_default())
    }

    async fn clear(&self, table: &str) -> Result<(), StorageError> {
        self.tables.insert(table.to_string(), Vec::new());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn tables(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_register_preserves_first_insertion_order() {
        let index = MemoryTableIndex::new();
        index.register("q2", &tables(&["users"]), 60).await.unwrap();
        index.register("q1", &tables(&["users"]), 60).await.unwrap();
        index.register("q2", &tables(&["users"]), 60).await.unwrap();

        assert_eq!(index.keys_for("users").await.unwrap(), vec!["q2", "q1"]);
    }

    #[tokio::test]
    async fn test_register_multiple_tables() {
        let index = MemoryTableIndex::new();
        index.register("join", &tables(&["users", "posts"]), 60).await.unwrap();

        assert_eq!(index.keys_for("users").await.unwrap(), vec!["join"]);
        assert_eq!(index.keys_for("posts").await.unwrap(), vec!["join"]);
        assert!(index.keys_for("comments").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_unknown_table_leaves_empty_entry() {
        let index = MemoryTableIndex::new();
        index.clear("ghost").await.unwrap();

        assert_eq!(index.table_count(), 1);
        assert!(index.keys_for("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_register() {
        let index = Arc::new(MemoryTableIndex::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let index = index.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..25 {
                    let key = format!("q-{}", i);
                    index.register(&key, &tables(&["users"]), 60).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(index.keys_for("users").await.unwrap().len(), 25);
    }
}
