//! Property-based tests (fuzzing) for TTL resolution and payload handling.
//!
//! Uses proptest to generate random hints and malformed payloads and verify
//! the cache never panics, only misses.
//!
//! Run with: `cargo test --test proptest_fuzz`

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{json, Value};

use table_cache::{CacheConfig, ExpiryConfig, IndexKind, InMemoryStore, KvStore, MutationOption, TableCache};

// =============================================================================
// Strategies for generating test data
// =============================================================================

fn expiry_strategy() -> impl Strategy<Value = ExpiryConfig> {
    (
        proptest::option::of(0u64..1_000_000),
        proptest::option::of(0u64..1_000_000_000),
        proptest::option::of(0u64..4_000_000_000),
        proptest::option::of(0u64..4_000_000_000_000),
    )
        .prop_map(|(ex, px, exat, pxat)| ExpiryConfig { ex, px, exat, pxat })
}

/// Arbitrary JSON values (rows of any shape)
fn arbitrary_json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        ".*".prop_map(Value::String),
    ];

    leaf.prop_recursive(3, 32, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
            prop::collection::hash_map("[a-z]{1,8}", inner, 0..8)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap()
}

fn memory_cache(store: Arc<InMemoryStore>) -> TableCache<InMemoryStore> {
    let config = CacheConfig {
        index: IndexKind::Memory,
        ..Default::default()
    };
    TableCache::from_config(store, &config).unwrap()
}

// =============================================================================
// TTL resolution
// =============================================================================

proptest! {
    /// The first hint present in ex > px > exat > pxat decides the TTL
    #[test]
    fn fuzz_ttl_precedence(config in expiry_strategy(), now in 0u64..4_000_000_000, default in 1u64..100_000) {
        let ttl = config.ttl_secs_at(default, now);
        let expected = if let Some(ex) = config.ex {
            ex
        } else if let Some(px) = config.px {
            px / 1000
        } else if let Some(exat) = config.exat {
            exat.saturating_sub(now)
        } else if let Some(pxat) = config.pxat {
            (pxat / 1000).saturating_sub(now)
        } else {
            default
        };
        prop_assert_eq!(ttl, expected);
    }

    /// Absolute deadlines never produce a TTL past the deadline
    #[test]
    fn fuzz_absolute_ttl_bounded(exat in 0u64..4_000_000_000, now in 0u64..4_000_000_000) {
        let ttl = ExpiryConfig::exat(exat).ttl_secs_at(300, now);
        prop_assert!(now + ttl <= exat.max(now));
    }

    /// ex always wins when present, whatever else is set
    #[test]
    fn fuzz_ex_dominates(ex in 0u64..1_000_000, rest in expiry_strategy(), now in 0u64..4_000_000_000) {
        let config = ExpiryConfig { ex: Some(ex), ..rest };
        prop_assert_eq!(config.ttl_secs_at(300, now), ex);
    }
}

// =============================================================================
// Payload handling
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any stored bytes decode to rows or to a miss, never a panic
    #[test]
    fn fuzz_get_on_random_payload(payload in ".*") {
        runtime().block_on(async {
            let store = Arc::new(InMemoryStore::new());
            store.set_with_ttl("drizzle:q", &payload, 60).await.unwrap();
            let cache = memory_cache(store);

            let result = cache.get::<Value>("q").await;
            if let Some(rows) = result {
                let reparsed: Vec<Value> = serde_json::from_str(&payload).unwrap();
                assert_eq!(rows, reparsed);
            }
        });
    }

    /// Whatever rows go in come back out unchanged
    #[test]
    fn fuzz_round_trip_arbitrary_rows(rows in prop::collection::vec(arbitrary_json_strategy(), 0..6)) {
        let back = runtime().block_on(async {
            let cache = memory_cache(Arc::new(InMemoryStore::new()));
            cache.put("q", &rows, &["t"], false, None).await;
            cache.get::<Value>("q").await
        });
        prop_assert_eq!(back, Some(rows));
    }

    /// Mutating a random subset of tables removes exactly the keys that
    /// read one of them
    #[test]
    fn fuzz_invalidation_matches_dependencies(
        deps in prop::collection::vec(prop::collection::btree_set(0usize..4, 1..3), 1..8),
        mutated in prop::collection::btree_set(0usize..4, 0..4),
    ) {
        let names = ["users", "posts", "orgs", "events"];
        runtime().block_on(async {
            let cache = memory_cache(Arc::new(InMemoryStore::new()));
            for (i, tables) in deps.iter().enumerate() {
                let tables: Vec<&str> = tables.iter().map(|t| names[*t]).collect();
                cache.put(&format!("q{}", i), &[json!(i)], &tables, false, None).await;
            }

            let mutation = MutationOption::new().tables(mutated.iter().map(|t| names[*t]));
            cache.on_mutate(mutation).await;

            for (i, tables) in deps.iter().enumerate() {
                let hit = cache.get::<Value>(&format!("q{}", i)).await.is_some();
                let invalidated = tables.iter().any(|t| mutated.contains(t));
                assert_eq!(hit, !invalidated, "q{} deps {:?} mutated {:?}", i, tables, mutated);
            }
        });
    }
}
