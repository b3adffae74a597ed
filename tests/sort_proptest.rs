//! Property-based coverage: for arbitrary inputs shaped to the sort
//! engine's preconditions, every coordination strategy must produce the
//! same sorted, element-preserving output.

use proptest::prelude::*;

use parasort::barrier::BarrierVariant;
use parasort::sort::{sort, SortMode};
use parasort::wait::WaitPolicy;

fn modes() -> Vec<SortMode> {
    vec![
        SortMode::Sequential,
        SortMode::Barrier(BarrierVariant::Sense),
        SortMode::LockFree,
        SortMode::Stealing {
            barrier_variant: BarrierVariant::Sense,
            wait_free: true,
        },
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// log2_segments in [2, 4], log2_per_segment in [0, 3]; num_threads
    /// divides num_segments. This keeps every combination valid per the
    /// sort engine's power-of-two and divisibility preconditions.
    #[test]
    fn sorted_output_is_permutation_of_input(
        log2_segments in 2u32..5,
        log2_per_segment in 0u32..4,
        seed in any::<u64>(),
    ) {
        let num_segments = 1usize << log2_segments;
        let segment_size = 1usize << log2_per_segment;
        let n = num_segments * segment_size;

        let mut input: Vec<i32> = (0..n as i32).collect();
        let mut s = seed | 1;
        for i in (1..input.len()).rev() {
            s ^= s << 13;
            s ^= s >> 7;
            s ^= s << 17;
            let j = (s as usize) % (i + 1);
            input.swap(i, j);
        }

        let mut expected = input.clone();
        expected.sort();

        for num_threads in [1usize, 2].into_iter().filter(|t| num_segments % t == 0) {
            for mode in modes() {
                let mut data = input.clone();
                sort(&mut data, mode, num_threads, segment_size, WaitPolicy::Yield);
                prop_assert_eq!(&data, &expected);
            }
        }
    }
}
