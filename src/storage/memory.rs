// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-process key-value store with TTL semantics matching Redis.
//!
//! Used for tests, local development, and single-process deployments that
//! don't want a Redis dependency. Expiry is lazy: an expired entry is
//! dropped the next time it is touched.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::traits::{KvStore, StorageError};

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Set(Vec<String>),
}

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    expires_at: Option<Instant>,
}

impl Slot {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

pub struct InMemoryStore {
    data: DashMap<String, Slot>,
    ops: AtomicU64,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            ops: AtomicU64::new(0),
        }
    }

    /// Number of live (unexpired) keys
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.data.iter().filter(|e| !e.value().is_expired(now)).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total store calls served since creation
    #[must_use]
    pub fn op_count(&self) -> u64 {
        self.ops.load(Ordering::Relaxed)
    }

    /// Remaining time-to-live of a key, `None` if missing or persistent.
    #[must_use]
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.data
            .get(key)
            .filter(|slot| !slot.is_expired(now))
            .and_then(|slot| slot.expires_at)
            .map(|at| at.saturating_duration_since(now))
    }

    pub fn clear(&self) {
        self.data.clear();
    }

    /// Deadline `ttl_secs` from `now`, or the error Redis gives for an
    /// expiry it can't represent.
    fn deadline(now: Instant, ttl_secs: u64, command: &str) -> Result<Instant, StorageError> {
        Some(ttl_secs)
            .filter(|&secs| secs > 0)
            .and_then(|secs| now.checked_add(Duration::from_secs(secs)))
            .ok_or_else(|| StorageError::Backend(format!("invalid expire time in '{}' command", command)))
    }

    fn tick(&self) {
        self.ops.fetch_add(1, Ordering::Relaxed);
    }

    /// Fetch a live slot, dropping it if expired.
    fn live(&self, key: &str) -> Option<Slot> {
        let now = Instant::now();
        let slot = self.data.get(key).map(|r| r.value().clone())?;
        if slot.is_expired(now) {
            self.data.remove_if(key, |_, s| s.is_expired(now));
            return None;
        }
        Some(slot)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.tick();
        match self.live(key) {
            None => Ok(None),
            Some(Slot { value: Value::Str(s), .. }) => Ok(Some(s)),
            Some(Slot { value: Value::Set(_), .. }) => Err(StorageError::WrongType { key: key.to_string() }),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StorageError> {
        self.tick();
        let deadline = Self::deadline(Instant::now(), ttl_secs, "set")?;
        self.data.insert(
            key.to_string(),
            Slot {
                value: Value::Str(value.to_string()),
                expires_at: Some(deadline),
            },
        );
        Ok(())
    }

    async fn unlink(&self, key: &str) -> Result<(), StorageError> {
        self.tick();
        self.data.remove(key);
        Ok(())
    }

    async fn set_add(&self, key: &str, member: &str, ttl_secs: u64) -> Result<(), StorageError> {
        self.tick();
        let now = Instant::now();
        let deadline = Self::deadline(now, ttl_secs, "expire")?;

        let mut entry = self.data.entry(key.to_string()).or_insert_with(|| Slot {
            value: Value::Set(Vec::new()),
            expires_at: Some(deadline),
        });
        let slot = entry.value_mut();
        if slot.is_expired(now) {
            *slot = Slot {
                value: Value::Set(Vec::new()),
                expires_at: Some(deadline),
            };
        }

        match &mut slot.value {
            Value::Set(members) => {
                if !members.iter().any(|m| m == member) {
                    members.push(member.to_string());
                }
            }
            Value::Str(_) => return Err(StorageError::WrongType { key: key.to_string() }),
        }

        // EXPIRE NX then EXPIRE GT
        slot.expires_at = Some(match slot.expires_at {
            Some(at) if at >= deadline => at,
            _ => deadline,
        });
        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StorageError> {
        self.tick();
        match self.live(key) {
            None => Ok(Vec::new()),
            Some(Slot { value: Value::Set(members), .. }) => Ok(members),
            Some(Slot { value: Value::Str(_), .. }) => Err(StorageError::WrongType { key: key.to_string() }),
        }
    }
}
