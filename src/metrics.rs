// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the table cache.
//!
//! Uses the `metrics` crate for backend-agnostic collection. The host picks
//! the exporter (Prometheus, OTEL, etc.).
//!
//! # Metric Naming Convention
//! - `table_cache_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `operation`: get, put, on_mutate
//! - `outcome`: hit, miss, error, success, skipped

use metrics::{counter, histogram};
use std::time::{Duration, Instant};

/// Record a cache lookup (hit / miss / error)
pub fn record_lookup(outcome: &str) {
    counter!(
        "table_cache_lookups_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a cache write (success / error / skipped)
pub fn record_write(outcome: &str) {
    counter!(
        "table_cache_writes_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record keys removed by an invalidation
pub fn record_invalidated(kind: &str, count: usize) {
    counter!(
        "table_cache_invalidated_keys_total",
        "kind" => kind.to_string()
    )
    .increment(count as u64);
}

/// Record a failed individual delete during invalidation
pub fn record_delete_failure() {
    counter!("table_cache_delete_failures_total").increment(1);
}

/// Record operation latency
pub fn record_latency(operation: &str, duration: Duration) {
    histogram!(
        "table_cache_operation_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record a store call routed through the circuit breaker
pub fn record_circuit_call(circuit: &str, outcome: &str) {
    counter!(
        "table_cache_circuit_breaker_calls_total",
        "circuit" => circuit.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// A timing guard that records latency on drop
pub struct LatencyTimer {
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(self.operation, self.start.elapsed());
    }
}
