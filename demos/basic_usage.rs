// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic table-cache usage.
//!
//! Demonstrates:
//! 1. Connecting to Redis
//! 2. Caching two query results that read different tables
//! 3. Hitting the cache
//! 4. Invalidating by table and by tag
//! 5. Displaying metrics
//!
//! # Prerequisites
//!
//! ```bash
//! docker run --rm -p 6379:6379 redis:7-alpine
//! ```
//!
//! # Run
//!
//! ```bash
//! RUST_LOG=table_cache=debug cargo run --example basic_usage
//! ```

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use table_cache::{CacheConfig, ExpiryConfig, MutationOption, TableCache};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize, Deserialize)]
struct PageView {
    path: String,
    views: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║              table-cache: Basic Usage Example                 ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Connect
    // ─────────────────────────────────────────────────────────────────────────
    let cache = TableCache::connect(CacheConfig {
        redis_url: Some("redis://localhost:6379".into()),
        namespace: "demo".into(),
        default_ttl_secs: 120,
        ..Default::default()
    })
    .await?;
    println!("🚀 Connected (strategy: {})", cache.strategy());

    // ─────────────────────────────────────────────────────────────────────────
    // 2. Cache two results
    // ─────────────────────────────────────────────────────────────────────────
    let top_pages = "select path, count(*) from events group by path [site=7]";
    let members = "select * from members where site = $1 [7]";

    if cache.get::<PageView>(top_pages).await.is_none() {
        let rows = vec![
            PageView { path: "/".into(), views: 1204 },
            PageView { path: "/pricing".into(), views: 311 },
        ];
        cache.put(top_pages, &rows, &["events", "sites"], false, None).await;
        println!("📝 Cached top pages (reads events, sites)");
    }

    let member_rows = vec![json!({"id": 1, "email": "ada@example.com"})];
    cache
        .put(members, &member_rows, &["members"], false, Some(&ExpiryConfig::ex(30)))
        .await;
    println!("📝 Cached members for 30s (reads members)");

    // ─────────────────────────────────────────────────────────────────────────
    // 3. Hit
    // ─────────────────────────────────────────────────────────────────────────
    if let Some(rows) = cache.get::<PageView>(top_pages).await {
        for row in &rows {
            println!("   ├─ {} → {} views", row.path, row.views);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Invalidate
    // ─────────────────────────────────────────────────────────────────────────
    let report = cache.on_mutate(MutationOption::new().table("events").tag("daily-report")).await;
    println!("\n🧹 Insert into events → unlinked {:?}", report.deleted);

    println!("   ├─ top pages cached: {}", cache.get::<PageView>(top_pages).await.is_some());
    println!("   └─ members cached:   {}", cache.get::<Value>(members).await.is_some());

    // ─────────────────────────────────────────────────────────────────────────
    // 5. Stats and metrics
    // ─────────────────────────────────────────────────────────────────────────
    let stats = cache.stats();
    println!(
        "\n📊 hits={} misses={} writes={} invalidated={} hit_rate={:.2}",
        stats.hits, stats.misses, stats.writes, stats.invalidated, stats.hit_rate
    );
    dump_metrics(&snapshotter);

    Ok(())
}

/// Print captured counters and histogram sample counts
fn dump_metrics(snapshotter: &Snapshotter) {
    let mut lines: Vec<String> = vec![];

    for (composite_key, _, _, value) in snapshotter.snapshot().into_vec() {
        let (_, key) = composite_key.into_parts();
        let labels: Vec<_> = key.labels().map(|l| format!("{}={}", l.key(), l.value())).collect();
        let label_str = if labels.is_empty() { String::new() } else { format!("{{{}}}", labels.join(",")) };

        match value {
            DebugValue::Counter(v) => lines.push(format!("{}{} = {}", key.name(), label_str, v)),
            DebugValue::Histogram(samples) => {
                lines.push(format!("{}{} count={}", key.name(), label_str, samples.len()))
            }
            DebugValue::Gauge(v) => lines.push(format!("{}{} = {:.2}", key.name(), label_str, v.into_inner())),
        }
    }

    lines.sort();
    for line in &lines {
        println!("   └─ {}", line);
    }
}
