// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Per-write expiry hints and TTL resolution.
//!
//! A caller may pass several hints at once; exactly one wins, in this order:
//!
//! | Field  | Meaning                        | TTL                               |
//! |--------|--------------------------------|-----------------------------------|
//! | `ex`   | relative seconds               | `ex`                              |
//! | `px`   | relative milliseconds          | `px / 1000`                       |
//! | `exat` | absolute unix seconds          | `max(0, exat - now)`              |
//! | `pxat` | absolute unix milliseconds     | `max(0, pxat / 1000 - now)`       |
//!
//! With no hint the cache's default TTL applies. Resolved TTLs are capped at
//! [`MAX_TTL_SECS`].

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Longest TTL the cache will ask a store for (about 68 years). Redis
/// rejects expiries whose millisecond deadline overflows an i64.
pub const MAX_TTL_SECS: u64 = i32::MAX as u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ex: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub px: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pxat: Option<u64>,
}

impl ExpiryConfig {
    #[must_use]
    pub fn ex(secs: u64) -> Self {
        Self { ex: Some(secs), ..Default::default() }
    }

    #[must_use]
    pub fn px(millis: u64) -> Self {
        Self { px: Some(millis), ..Default::default() }
    }

    #[must_use]
    pub fn exat(unix_secs: u64) -> Self {
        Self { exat: Some(unix_secs), ..Default::default() }
    }

    #[must_use]
    pub fn pxat(unix_millis: u64) -> Self {
        Self { pxat: Some(unix_millis), ..Default::default() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ex.is_none() && self.px.is_none() && self.exat.is_none() && self.pxat.is_none()
    }

    /// TTL in seconds relative to `now_secs`. Absolute deadlines in the past
    /// clamp to 0.
    #[must_use]
    pub fn ttl_secs_at(&self, default_ttl_secs: u64, now_secs: u64) -> u64 {
        if let Some(ex) = self.ex {
            ex
        } else if let Some(px) = self.px {
            px / 1000
        } else if let Some(exat) = self.exat {
            exat.saturating_sub(now_secs)
        } else if let Some(pxat) = self.pxat {
            (pxat / 1000).saturating_sub(now_secs)
        } else {
            default_ttl_secs
        }
    }
}

/// Resolve the TTL for a write against the wall clock, capped at
/// [`MAX_TTL_SECS`].
pub fn resolve_ttl(config: Option<&ExpiryConfig>, default_ttl_secs: u64) -> u64 {
    let ttl = match config {
        Some(config) => config.ttl_secs_at(default_ttl_secs, unix_now_secs()),
        None => default_ttl_secs,
    };
    ttl.min(MAX_TTL_SECS)
}

pub(crate) fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
