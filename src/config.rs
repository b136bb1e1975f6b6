// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the table cache.
//!
//! # Example
//!
//! ```
//! use table_cache::{CacheConfig, CacheStrategy};
//!
//! // Minimal config (uses defaults)
//! let config = CacheConfig::default();
//! assert_eq!(config.default_ttl_secs, 300);
//! assert_eq!(config.namespace, "drizzle");
//!
//! // Full config
//! let config = CacheConfig {
//!     redis_url: Some("redis://localhost:6379".into()),
//!     namespace: "analytics".into(),
//!     default_ttl_secs: 60,
//!     strategy: CacheStrategy::All,
//!     ..Default::default()
//! };
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::error::CacheError;
use crate::resilience::circuit_breaker::CircuitConfig;

/// Whether the host consults the cache per query or for every query.
///
/// The cache only reports this; enforcing it is the host's job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStrategy {
    /// Host opts individual queries in
    #[default]
    Explicit,
    /// Every query goes through the cache unless opted out
    All,
}

impl std::fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Explicit => write!(f, "explicit"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Where the table → keys index lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// In-process; lost on restart
    Memory,
    /// Persisted in the backing store under `<namespace>#table:<table>`
    #[default]
    Store,
}

/// Configuration for [`crate::TableCache`].
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Redis connection string (e.g., "redis://localhost:6379").
    /// Required by [`crate::TableCache::connect`].
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Prefix for every physical key (default: "drizzle")
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// TTL when a write carries no expiry hint (default: 300)
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,

    #[serde(default)]
    pub strategy: CacheStrategy,

    #[serde(default)]
    pub index: IndexKind,

    /// Store failure ratio that opens the circuit
    #[serde(default = "default_circuit_error_rate")]
    pub circuit_error_rate: f32,

    /// Calls observed before the failure ratio is evaluated
    #[serde(default = "default_circuit_window")]
    pub circuit_window: usize,

    /// Seconds the circuit stays open before probing again
    #[serde(default = "default_circuit_recovery_secs")]
    pub circuit_recovery_secs: u64,
}

fn default_namespace() -> String { "drizzle".to_string() }
fn default_ttl_secs() -> u64 { 300 }
fn default_circuit_error_rate() -> f32 { 0.5 }
fn default_circuit_window() -> usize { 10 }
fn default_circuit_recovery_secs() -> u64 { 30 }

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            namespace: default_namespace(),
            default_ttl_secs: default_ttl_secs(),
            strategy: CacheStrategy::default(),
            index: IndexKind::default(),
            circuit_error_rate: default_circuit_error_rate(),
            circuit_window: default_circuit_window(),
            circuit_recovery_secs: default_circuit_recovery_secs(),
        }
    }
}

impl CacheConfig {
    /// Reject configurations the cache can't run with.
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.default_ttl_secs == 0 {
            return Err(CacheError::Config("default_ttl_secs must be positive".into()));
        }
        if !(self.circuit_error_rate > 0.0 && self.circuit_error_rate <= 1.0) {
            return Err(CacheError::Config("circuit_error_rate must be in (0, 1]".into()));
        }
        Ok(())
    }

    pub(crate) fn circuit(&self) -> CircuitConfig {
        CircuitConfig {
            error_rate: self.circuit_error_rate,
            window: self.circuit_window,
            recovery_timeout: Duration::from_secs(self.circuit_recovery_secs),
            ..CircuitConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_defaults() {
        let config: CacheConfig = serde_json::from_str(r#"{"redis_url": "redis://cache:6379", "strategy": "all"}"#).unwrap();

        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.strategy, CacheStrategy::All);
        assert_eq!(config.namespace, "drizzle");
        assert_eq!(config.default_ttl_secs, 300);
        assert_eq!(config.index, IndexKind::Store);
    }

    #[test]
    fn test_memory_index_kind() {
        let config: CacheConfig = serde_json::from_str(r#"{"index": "memory"}"#).unwrap();
        assert_eq!(config.index, IndexKind::Memory);
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let config = CacheConfig { default_ttl_secs: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(CacheError::Config(_))));
        assert!(CacheConfig::default().validate().is_ok());
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(CacheStrategy::Explicit.to_string(), "explicit");
        assert_eq!(CacheStrategy::All.to_string(), "all");
    }
}
