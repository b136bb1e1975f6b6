// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Table-aware query result cache.
//!
//! # Flow
//!
//! ```text
//! Query arrives (key, tables)
//!       │
//!       ▼
//! ┌─────────────────────────────┐
//! │  get(key)                   │
//! │  GET <namespace>:<key>      │
//! └─────────────────────────────┘
//!       │
//!       ├─→ Hit → return rows
//!       │
//!       └─→ Miss → host runs query → put(key, rows, tables)
//!                    SET <namespace>:<key> <json> EX <ttl>
//!                    index[table] += key   (for each table)
//!
//! Mutation (tags, tables)
//!       │
//!       ▼
//!   keys = ∪ index[table]  ∪  { <namespace>:tag:<tag> }
//!   UNLINK each key (concurrently, best-effort)
//!   index[table] = []      (for each table)
//! ```
//!
//! Nothing in here returns an error to the caller once the cache is built.
//! A store or decode failure is logged and shows up as a miss; the host's
//! query path always proceeds.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::{CacheConfig, CacheStrategy, IndexKind};
use crate::error::CacheError;
use crate::expiry::{resolve_ttl, ExpiryConfig};
use crate::index::{MemoryTableIndex, StoreTableIndex, TableIndex};
use crate::metrics::{self, LatencyTimer};
use crate::mutation::{MutationOption, TableRef};
use crate::storage::{KvStore, RedisStore};

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    /// Lookups answered from the store
    pub hits: u64,
    /// Lookups that found nothing (including failed lookups)
    pub misses: u64,
    /// Store or payload failures absorbed by the cache
    pub errors: u64,
    /// Entries written
    pub writes: u64,
    /// Keys removed by `on_mutate`
    pub invalidated: u64,
    /// hits / (hits + misses), 0.0 when idle
    pub hit_rate: f64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
    writes: AtomicU64,
    invalidated: AtomicU64,
}

/// What an `on_mutate` call removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationReport {
    /// Physical keys unlinked, sorted
    pub deleted: Vec<String>,
    /// Physical keys whose unlink failed, sorted
    pub failed: Vec<String>,
}

impl MutationReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.failed.is_empty()
    }
}

/// Query result cache keyed by query identity and invalidated by table.
pub struct TableCache<S: KvStore + 'static> {
    store: Arc<S>,
    index: Arc<dyn TableIndex>,
    namespace: String,
    default_ttl_secs: u64,
    strategy: CacheStrategy,
    counters: Counters,
}

impl TableCache<RedisStore> {
    /// Connect to Redis using `config.redis_url`.
    ///
    /// Fails if no URL is configured, the config is invalid, or Redis can't
    /// be reached after a few attempts.
    pub async fn connect(config: CacheConfig) -> Result<Self, CacheError> {
        config.validate()?;
        let url = config
            .redis_url
            .as_deref()
            .ok_or_else(|| CacheError::Config("redis_url is required".into()))?;

        let store = RedisStore::with_circuit(url, config.circuit()).await?;
        Self::from_config(Arc::new(store), &config)
    }
}

impl<S: KvStore + 'static> TableCache<S> {
    /// Build a cache over `store` with an explicit index.
    pub fn new(store: Arc<S>, index: Arc<dyn TableIndex>, config: &CacheConfig) -> Result<Self, CacheError> {
        config.validate()?;
        Ok(Self {
            store,
            index,
            namespace: config.namespace.clone(),
            default_ttl_secs: config.default_ttl_secs,
            strategy: config.strategy,
            counters: Counters::default(),
        })
    }

    /// Build a cache over `store`, choosing the index from `config.index`.
    pub fn from_config(store: Arc<S>, config: &CacheConfig) -> Result<Self, CacheError> {
        let index: Arc<dyn TableIndex> = match config.index {
            IndexKind::Memory => Arc::new(MemoryTableIndex::new()),
            IndexKind::Store => Arc::new(StoreTableIndex::new(store.clone(), config.namespace.clone())),
        };
        Self::new(store, index, config)
    }

    #[must_use]
    pub fn strategy(&self) -> CacheStrategy {
        self.strategy
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn default_ttl_secs(&self) -> u64 {
        self.default_ttl_secs
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn index(&self) -> &Arc<dyn TableIndex> {
        &self.index
    }

    #[inline]
    fn physical_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    #[inline]
    fn tag_key(&self, tag: &str) -> String {
        format!("{}:tag:{}", self.namespace, tag)
    }

    /// Look up cached rows for `key`.
    ///
    /// Returns `None` on a miss, on a store failure, and when the stored
    /// payload can't be decoded as `Vec<T>`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<Vec<T>> {
        let _timer = LatencyTimer::new("get");
        let physical = self.physical_key(key);

        let payload = match self.store.get(&physical).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                debug!(key, "Cache miss");
                self.record_miss();
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, treating as miss");
                self.record_error();
                return None;
            }
        };

        match serde_json::from_str::<Vec<T>>(&payload) {
            Ok(rows) => {
                debug!(key, rows = rows.len(), "Cache hit");
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                metrics::record_lookup("hit");
                Some(rows)
            }
            Err(e) => {
                warn!(key, error = %e, "Cached payload undecodable, treating as miss");
                self.record_error();
                None
            }
        }
    }

    /// Store `rows` under `key` and register the key against every table
    /// the query read.
    ///
    /// `is_tag` is accepted for host compatibility; tag entries are
    /// invalidated directly by name and never go through the table index.
    pub async fn put<T, R>(&self, key: &str, rows: &[T], tables: &[R], is_tag: bool, config: Option<&ExpiryConfig>)
    where
        T: Serialize,
        R: TableRef,
    {
        let _timer = LatencyTimer::new("put");
        let ttl_secs = resolve_ttl(config, self.default_ttl_secs);

        if ttl_secs == 0 {
            debug!(key, "Expiry already passed, not caching");
            metrics::record_write("skipped");
            return;
        }

        let payload = match serde_json::to_string(rows) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "Rows not serializable, not caching");
                self.record_write_error();
                return;
            }
        };

        let physical = self.physical_key(key);
        if let Err(e) = self.store.set_with_ttl(&physical, &payload, ttl_secs).await {
            warn!(key, error = %e, "Cache write failed");
            self.record_write_error();
            return;
        }
        self.counters.writes.fetch_add(1, Ordering::Relaxed);
        metrics::record_write("success");

        let tables: Vec<String> = tables.iter().map(|t| t.table_name().to_string()).collect();
        if tables.is_empty() {
            return;
        }
        if let Err(e) = self.index.register(key, &tables, ttl_secs).await {
            warn!(key, error = %e, "Failed to register key in table index");
            self.counters.errors.fetch_add(1, Ordering::Relaxed);
        }
        debug!(key, ttl_secs, is_tag, tables = ?tables, "Cached query result");
    }

    /// Invalidate everything cached against `mutation.tables`, plus the
    /// entries named by `mutation.tags`.
    ///
    /// Each physical key is unlinked once even if several tables tracked
    /// it. Every named table's tracked keys are reset afterwards, including
    /// tables that had none.
    pub async fn on_mutate(&self, mutation: MutationOption) -> MutationReport {
        let _timer = LatencyTimer::new("on_mutate");
        let MutationOption { tags, tables } = mutation;

        let mut seen: HashSet<String> = HashSet::new();
        let mut pending: Vec<String> = Vec::new();

        for table in &tables {
            match self.index.keys_for(table).await {
                Ok(keys) => {
                    for key in keys {
                        let physical = self.physical_key(&key);
                        if seen.insert(physical.clone()) {
                            pending.push(physical);
                        }
                    }
                }
                Err(e) => {
                    warn!(table = %table, error = %e, "Failed to read table index");
                    self.counters.errors.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        let mut tag_keys: HashSet<String> = HashSet::new();
        for tag in &tags {
            let physical = self.tag_key(tag);
            if seen.insert(physical.clone()) {
                tag_keys.insert(physical.clone());
                pending.push(physical);
            }
        }

        let report = if pending.is_empty() {
            MutationReport::default()
        } else {
            self.unlink_all(pending).await
        };

        for table in &tables {
            if let Err(e) = self.index.clear(table).await {
                warn!(table = %table, error = %e, "Failed to clear table index");
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
            }
        }

        let deleted = report.deleted.len();
        let tag_deleted = report.deleted.iter().filter(|key| tag_keys.contains(*key)).count();
        self.counters.invalidated.fetch_add(deleted as u64, Ordering::Relaxed);
        metrics::record_invalidated("table", deleted - tag_deleted);
        metrics::record_invalidated("tag", tag_deleted);
        debug!(
            tables = ?tables,
            tags = ?tags,
            deleted,
            failed = report.failed.len(),
            "Invalidation sweep complete"
        );
        report
    }

    /// Issue every unlink concurrently. Failures are reported, never retried.
    async fn unlink_all(&self, keys: Vec<String>) -> MutationReport {
        let mut join_set: JoinSet<(String, Result<(), crate::storage::StorageError>)> = JoinSet::new();
        for key in keys {
            let store = self.store.clone();
            join_set.spawn(async move {
                let result = store.unlink(&key).await;
                (key, result)
            });
        }

        let mut report = MutationReport::default();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((key, Ok(()))) => report.deleted.push(key),
                Ok((key, Err(e))) => {
                    warn!(key = %key, error = %e, "Failed to unlink cache entry");
                    metrics::record_delete_failure();
                    self.counters.errors.fetch_add(1, Ordering::Relaxed);
                    report.failed.push(key);
                }
                Err(e) => {
                    warn!(error = %e, "Unlink task aborted");
                    metrics::record_delete_failure();
                    self.counters.errors.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        report.deleted.sort();
        report.failed.sort();
        report
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        let hits = self.counters.hits.load(Ordering::Relaxed);
        let misses = self.counters.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            hits,
            misses,
            errors: self.counters.errors.load(Ordering::Relaxed),
            writes: self.counters.writes.load(Ordering::Relaxed),
            invalidated: self.counters.invalidated.load(Ordering::Relaxed),
            hit_rate: if total > 0 { hits as f64 / total as f64 } else { 0.0 },
        }
    }

    fn record_miss(&self) {
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        metrics::record_lookup("miss");
    }

    fn record_error(&self) {
        self.counters.errors.fetch_add(1, Ordering::Relaxed);
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        metrics::record_lookup("error");
    }

    fn record_write_error(&self) {
        self.counters.errors.fetch_add(1, Ordering::Relaxed);
        metrics::record_write("error");
    }
}
