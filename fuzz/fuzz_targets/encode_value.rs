#![no_main]

use jsonpool::{BufferPool, PoolConfig};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<Value>(data) else {
        return;
    };
    let expected = serde_json::to_string(&value).unwrap();

    // Always-stream, early promotion, default, never-stream
    for threshold in [0, 64, 8 * 1024, usize::MAX] {
        let mut pool =
            BufferPool::with_config(PoolConfig::default().with_stream_threshold(threshold));

        // Verify: pooled output matches direct encoding, first use and reuse
        assert_eq!(pool.encode_with_pool(&value).unwrap(), expected);
        assert_eq!(pool.encode_with_pool(&value).unwrap(), expected);
        assert_eq!(&pool.encode_to_bytes(&value).unwrap()[..], expected.as_bytes());

        // Verify: every lent buffer came back
        assert_eq!(pool.counters().current_usage, 0);
    }
});
