// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors raised while building a cache. Once built, cache operations never
/// return errors.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Invalid cache configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
