//! Property-based tests for offload-core value types.

use offload_core::{
    BufferSpec, KeyVector, SUPPORTED_SAMPLE_RATES, Timestamp, sample_rate_tag, tag_sample_rate,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A rate maps to an adapter tag exactly when it is in the supported set,
    /// and the tag maps back to the same rate.
    #[test]
    fn sample_rate_map_is_total_and_invertible(rate in any::<u32>()) {
        match sample_rate_tag(rate) {
            Some(tag) => {
                prop_assert!(SUPPORTED_SAMPLE_RATES.contains(&rate));
                prop_assert_eq!(tag_sample_rate(tag), Some(rate));
            }
            None => prop_assert!(!SUPPORTED_SAMPLE_RATES.contains(&rate)),
        }
    }

    /// Splitting a microsecond timestamp never loses time and keeps nanos in range.
    #[test]
    fn timestamp_split_is_lossless(micros in 0u64..(u64::MAX / 1000)) {
        let ts = Timestamp::from_micros(micros);
        prop_assert!(ts.nanos < 1_000_000_000);
        prop_assert_eq!(ts.secs * 1_000_000 + u64::from(ts.nanos) / 1000, micros);
    }

    /// Summing `next_chunk` until nothing remains covers the request in
    /// ceil(N / B) chunks.
    #[test]
    fn chunking_covers_request(total in 0usize..100_000, block in 1usize..4096) {
        let spec = BufferSpec::blocking(block, 4);
        let mut remaining = total;
        let mut chunks = 0usize;
        while remaining > 0 {
            let n = spec.next_chunk(remaining);
            prop_assert!(n > 0 && n <= block);
            remaining -= n;
            chunks += 1;
        }
        prop_assert_eq!(chunks, total.div_ceil(block));
    }

    /// Key vectors keep every pushed pair, in order.
    #[test]
    fn key_vector_keeps_order(pairs in prop::collection::vec((any::<u32>(), any::<u32>()), 0..32)) {
        let kv = KeyVector::from(pairs.clone());
        let back: Vec<(u32, u32)> = kv.iter().map(|p| (p.key, p.value)).collect();
        prop_assert_eq!(back, pairs);
    }
}
