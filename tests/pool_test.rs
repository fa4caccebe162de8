// Integration tests for the BufferPool public API
// Tests cover: size classes, reuse, statistics, configuration, encoding transparency

use std::collections::{BTreeMap, BTreeSet, HashSet};

use jsonpool::{
    BufferMode, BufferPool, GrowableBuffer, PoolConfig, PoolConfigPatch, Shape, SizeCategories,
    estimate, normalize_capacity,
};
use proptest::prelude::*;
use serde::Serialize;
use serde_json::{Value, json};

// ============================================================================
// Size Classes and Reuse
// ============================================================================

#[test]
fn test_nearby_requests_share_one_class() {
    let mut pool = BufferPool::new();

    for requested in [1000, 1024, 900] {
        let buffer = pool.get_buffer(requested);
        assert_eq!(buffer.capacity(), 1024, "{} should resolve to 1024", requested);
        pool.return_buffer(buffer);
    }

    let stats = pool.statistics();
    assert_eq!(stats.counters.allocations, 1, "Only the first request allocates");
    assert_eq!(stats.counters.reuses, 2, "2nd and 3rd requests are reuses");
    assert_eq!(stats.size_classes.len(), 1);
    assert_eq!(stats.size_classes[0].key, "pool_1024");
}

#[test]
fn test_reuse_yields_same_buffer_reset() {
    let mut pool = BufferPool::new();

    let mut buffer = pool.get_buffer(4096);
    let id = buffer.id();
    buffer.append_json(&json!({"payload": "x".repeat(100)})).unwrap();
    let _ = buffer.finalize();
    pool.return_buffer(buffer);

    let reused = pool.get_buffer(4096);
    assert_eq!(reused.id(), id, "Same buffer instance must be handed out");
    assert_eq!(reused.len(), 0, "Reused buffer must be empty");
    assert_eq!(reused.capacity(), 4096);
}

#[test]
fn test_outstanding_buffers_are_never_shared() {
    let mut pool = BufferPool::new();
    let a = pool.get_buffer(256);
    let b = pool.get_buffer(256);
    assert_ne!(a.id(), b.id());

    let stats = pool.statistics();
    assert_eq!(stats.counters.current_usage, 2);
    assert_eq!(stats.total_buffers_pooled, 0);
}

#[test]
fn test_pool_cap_is_enforced_per_class() {
    let mut pool = BufferPool::with_config(PoolConfig::default().with_max_pool_size(3));

    let small: Vec<_> = (0..10).map(|_| pool.get_buffer(128)).collect();
    let large: Vec<_> = (0..2).map(|_| pool.get_buffer(32768)).collect();
    for buffer in small.into_iter().chain(large) {
        pool.return_buffer(buffer);
    }

    let stats = pool.statistics();
    assert_eq!(stats.size_classes[0].capacity_bytes, 128);
    assert_eq!(stats.size_classes[0].buffers_available, 3);
    assert_eq!(stats.size_classes[1].capacity_bytes, 32768);
    assert_eq!(stats.size_classes[1].buffers_available, 2);
}

// ============================================================================
// Statistics
// ============================================================================

#[test]
fn test_statistics_invariants() {
    let mut pool = BufferPool::new();
    let empty = pool.statistics();
    assert_eq!(empty.reuse_rate, 0.0, "No operations means a 0% reuse rate");
    assert_eq!(empty.total_operations, 0);

    for capacity in [64, 64, 2048, 64, 100_000] {
        let buffer = pool.get_buffer(capacity);
        pool.return_buffer(buffer);
    }

    let stats = pool.statistics();
    let counters = stats.counters;
    assert_eq!(counters.allocations + counters.reuses, stats.total_operations);
    assert_eq!(
        stats.reuse_rate,
        counters.reuses as f64 / stats.total_operations as f64 * 100.0
    );
    assert_eq!(stats.reuse_rate, 40.0);
    assert_eq!(
        stats.buffers_by_size.values().sum::<usize>(),
        stats.total_buffers_pooled
    );
    assert_eq!(
        stats
            .size_classes
            .iter()
            .map(|c| c.buffers_available)
            .sum::<usize>(),
        stats.total_buffers_pooled
    );
    assert_eq!(stats.buffers_by_size["128.0KB (131072 bytes)"], 1);
}

#[test]
fn test_peak_usage_tracks_high_water_mark() {
    let mut pool = BufferPool::new();
    let held: Vec<_> = (0..4).map(|_| pool.get_buffer(64)).collect();
    for buffer in held {
        pool.return_buffer(buffer);
    }
    let buffer = pool.get_buffer(64);
    pool.return_buffer(buffer);

    let counters = *pool.counters();
    assert_eq!(counters.peak_usage, 4);
    assert_eq!(counters.current_usage, 0);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_category_merge_example() {
    let mut table = SizeCategories::from_pairs([
        ("tiny", 256),
        ("small", 1024),
        ("medium", 4096),
        ("large", 16384),
    ]);
    table.merge(&SizeCategories::from_pairs([("medium", 8192), ("xlarge", 65536)]));

    assert_eq!(
        table,
        SizeCategories::from_pairs([
            ("tiny", 256),
            ("small", 1024),
            ("medium", 8192),
            ("large", 16384),
            ("xlarge", 65536),
        ])
    );
    let ordered: Vec<_> = table.iter().collect();
    assert_eq!(
        ordered,
        vec![
            ("tiny", 256),
            ("small", 1024),
            ("medium", 8192),
            ("large", 16384),
            ("xlarge", 65536),
        ]
    );
}

#[test]
fn test_category_merge_through_configure() {
    let mut pool = BufferPool::new();
    pool.configure(
        PoolConfigPatch::new()
            .with_category("medium", 8192)
            .with_category("xlarge", 131072),
    )
    .unwrap();

    let table: Vec<_> = pool.config().size_categories().iter().collect();
    assert_eq!(
        table,
        vec![
            ("small", 1024),
            ("medium", 8192),
            ("large", 16384),
            ("xlarge", 131072),
        ]
    );
}

#[test]
fn test_configure_from_json() {
    let mut pool = BufferPool::new();
    let patch = PoolConfigPatch::from_json(&json!({
        "maxPoolSize": 1,
        "sizeCategories": { "small": 512 }
    }))
    .unwrap();
    pool.configure(patch).unwrap();

    assert_eq!(pool.config().max_pool_size(), 1);
    assert_eq!(pool.config().size_categories().get("small"), Some(512));
    assert_eq!(pool.config().default_capacity(), 4096, "Unmentioned scalars stay");
    assert_eq!(pool.optimal_capacity(&vec![1, 2]), 512);
}

#[test]
fn test_invalid_configure_is_rejected() {
    let mut pool = BufferPool::new();
    for bad in [json!(0), json!(-1), json!(2.5), json!("big")] {
        let err = PoolConfigPatch::from_json(&json!({ "sizeCategories": { "huge": bad } }))
            .unwrap_err();
        assert!(err.is_config(), "{:?} must be a config error", bad);
    }

    let err = pool
        .configure(PoolConfigPatch::new().with_category("zero", 0))
        .unwrap_err();
    assert!(err.is_config());
    assert_eq!(pool.config(), &PoolConfig::default());
}

#[test]
fn test_reset_and_clear() {
    let mut pool = BufferPool::new();
    pool.configure(PoolConfigPatch::new().with_max_pool_size(1))
        .unwrap();
    let buffer = pool.get_buffer(64);
    pool.return_buffer(buffer);

    pool.reset_configuration();
    assert_eq!(pool.config(), &PoolConfig::default());
    assert_eq!(pool.statistics().total_buffers_pooled, 1, "Reset keeps idle buffers");

    pool.clear_pools();
    let stats = pool.statistics();
    assert_eq!(stats.total_buffers_pooled, 0);
    assert_eq!(stats.total_operations, 0);
}

// ============================================================================
// Estimation
// ============================================================================

#[test]
fn test_estimation_scenarios() {
    let pool = BufferPool::new();
    assert_eq!(estimate(&json!([])), 2);
    assert_eq!(estimate(&[1, 2, 3, 4, 5]), 512);
    assert_eq!(pool.optimal_capacity(&[1, 2, 3, 4, 5]), 1024);
    assert_eq!(pool.optimal_capacity(&vec![0u8; 5000]), 65536);
    assert_eq!(pool.optimal_capacity(&"y".repeat(100_000)), 131072);
}

#[derive(Serialize)]
struct Order {
    id: u64,
    customer: String,
    lines: Vec<(String, u32)>,
}

#[test]
fn test_derived_record() {
    let mut pool = BufferPool::new();
    let order = Order {
        id: 9,
        customer: "Åsa/Nord".into(),
        lines: vec![("widget".into(), 2)],
    };
    assert_eq!(Shape::of(&order), Shape::Record(3));
    assert_eq!(pool.optimal_capacity(&order), 1024);
    assert_eq!(
        pool.encode_with_pool(&order).unwrap(),
        r#"{"id":9,"customer":"Åsa/Nord","lines":[["widget",2]]}"#
    );
}

#[test]
fn test_encode_std_sets() {
    let mut pool = BufferPool::new();
    let ids: HashSet<u32> = [42].into_iter().collect();
    assert_eq!(pool.encode_with_pool(&ids).unwrap(), "[42]");

    let names: BTreeSet<&str> = ["b", "a"].into_iter().collect();
    assert_eq!(pool.encode_with_pool(&names).unwrap(), r#"["a","b"]"#);
    assert_eq!(pool.optimal_capacity(&names), 1024);
    assert_eq!(pool.counters().current_usage, 0);
}

// ============================================================================
// Encoding Transparency
// ============================================================================

#[test]
fn test_underestimated_payload_still_encodes() {
    let mut pool = BufferPool::new();
    let mut record = BTreeMap::new();
    record.insert("blob", "z".repeat(200_000));

    assert_eq!(pool.optimal_capacity(&record), 1024);
    let text = pool.encode_with_pool(&record).unwrap();
    assert_eq!(text, serde_json::to_string(&record).unwrap());
}

#[test]
fn test_migration_matches_direct_stream() {
    let content: Vec<String> = (0..500).map(|i| format!("item-{}", i)).collect();

    let mut migrating = GrowableBuffer::with_stream_threshold(64, 1024);
    assert_eq!(migrating.mode(), BufferMode::Inline);
    migrating.append_json(&content).unwrap();
    assert_eq!(migrating.mode(), BufferMode::Stream);

    let mut direct = GrowableBuffer::with_stream_threshold(2048, 1024);
    assert_eq!(direct.mode(), BufferMode::Stream);
    direct.append_json(&content).unwrap();

    assert_eq!(migrating.finalize(), direct.finalize());
    assert_eq!(migrating.finalize_bytes(), direct.finalize_bytes());
}

// ============================================================================
// Properties
// ============================================================================

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-1.0e12f64..1.0e12).prop_map(Value::from),
        ".{0,40}".prop_map(Value::from),
    ];
    leaf.prop_recursive(4, 256, 12, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..12).prop_map(Value::Array),
            prop::collection::btree_map("[a-z/é]{0,8}", inner, 0..12)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn prop_normalize_idempotent_and_monotonic(a in 0usize..1 << 40, b in 0usize..1 << 40) {
        let na = normalize_capacity(a);
        prop_assert!(na.is_power_of_two());
        prop_assert!(na >= a);
        prop_assert_eq!(normalize_capacity(na), na);
        if a <= b {
            prop_assert!(na <= normalize_capacity(b));
        }
    }

    #[test]
    fn prop_get_buffer_capacity_is_normalized(capacity in 0usize..1 << 20) {
        let mut pool = BufferPool::new();
        prop_assert_eq!(pool.get_buffer(capacity).capacity(), normalize_capacity(capacity));
    }

    #[test]
    fn prop_encode_is_transparent(value in arb_json()) {
        let mut pool = BufferPool::with_config(PoolConfig::default().with_stream_threshold(256));
        let expected = serde_json::to_string(&value).unwrap();
        prop_assert_eq!(pool.encode_with_pool(&value).unwrap(), expected.clone());
        // Second pass reuses the returned buffer.
        prop_assert_eq!(pool.encode_with_pool(&value).unwrap(), expected);
        prop_assert_eq!(pool.counters().reuses, 1);
    }

    #[test]
    fn prop_queue_never_exceeds_cap(cap in 0usize..8, returns in 0usize..32) {
        let mut pool = BufferPool::with_config(PoolConfig::default().with_max_pool_size(cap));
        let buffers: Vec<_> = (0..returns).map(|_| pool.get_buffer(512)).collect();
        for buffer in buffers {
            pool.return_buffer(buffer);
        }
        prop_assert_eq!(pool.statistics().total_buffers_pooled, returns.min(cap));
    }
}
