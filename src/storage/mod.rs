// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Backing key-value stores.
//!
//! - [`redis::RedisStore`]: production store (Redis 7+)
//! - [`memory::InMemoryStore`]: in-process store with the same TTL semantics

pub mod memory;
pub mod redis;
pub mod traits;

pub use memory::InMemoryStore;
pub use self::redis::RedisStore;
pub use traits::{KvStore, StorageError};
