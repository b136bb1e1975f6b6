// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # Table Cache
//!
//! A write-through query result cache that sits between an ORM and Redis and
//! invalidates by **table**: every cached result remembers which tables it
//! read, so a write to `users` drops exactly the results that depended on
//! `users`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Host (ORM / query layer)               │
//! │  • Derives a deterministic key per query                    │
//! │  • Resolves the tables each query reads                     │
//! └─────────────────────────────────────────────────────────────┘
//!            │ get / put                     │ on_mutate
//!            ▼                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       TableCache                            │
//! │  • TTL resolution (ex > px > exat > pxat > default)         │
//! │  • Table index: table → cached keys                         │
//! │  • Concurrent best-effort UNLINK sweep                      │
//! │  • Failures logged, never propagated                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 KvStore (Redis / in-memory)                 │
//! │  <ns>:<key>          → JSON rows, native TTL                │
//! │  <ns>:tag:<tag>      → tag-named entries                    │
//! │  <ns>#table:<table>  → SET of keys (store-backed index)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use table_cache::{CacheConfig, MutationOption, TableCache};
//! use serde_json::{json, Value};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = TableCache::connect(CacheConfig {
//!         redis_url: Some("redis://localhost:6379".into()),
//!         ..Default::default()
//!     })
//!     .await?;
//!
//!     let key = "select * from users where org = $1 [42]";
//!     if cache.get::<Value>(key).await.is_none() {
//!         let rows = vec![json!({"id": 1, "name": "Ada"})];
//!         cache.put(key, &rows, &["users"], false, None).await;
//!     }
//!
//!     // An UPDATE on users invalidates every result that read it
//!     cache.on_mutate(MutationOption::new().table("users")).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`cache`]: [`TableCache`] get / put / on_mutate
//! - [`index`]: table index (in-memory or store-backed)
//! - [`storage`]: backing stores (Redis, in-memory)
//! - [`expiry`]: per-write expiry hints
//! - [`resilience`]: circuit breaker and connect retry

pub mod cache;
pub mod config;
pub mod error;
pub mod expiry;
pub mod index;
pub mod metrics;
pub mod mutation;
pub mod resilience;
pub mod storage;

pub use cache::{CacheStats, MutationReport, TableCache};
pub use config::{CacheConfig, CacheStrategy, IndexKind};
pub use error::CacheError;
pub use expiry::{ExpiryConfig, MAX_TTL_SECS};
pub use index::{MemoryTableIndex, StoreTableIndex, TableIndex};
pub use mutation::{MutationOption, TableRef};
pub use resilience::circuit_breaker::{CircuitBreaker, CircuitConfig, CircuitError};
pub use resilience::retry::RetryConfig;
pub use storage::{InMemoryStore, KvStore, RedisStore, StorageError};
