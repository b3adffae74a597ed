//! Segmented bitonic-merge sort engine (C5), the public entry point.
//!
//! `sort` partitions the input into equal-size segments, sorts each in
//! place, then runs the log₂(N)·(log₂(N)+1)/2-stage bitonic merging
//! network (§4.5.1) over them, coordinating the stages with one of five
//! strategies (§4.5.2). All five produce the same output for the same
//! input (§8 #3); they differ only in how threads agree "stage s is
//! done everywhere, stage s+1 may begin."

use std::ops::Range;
use std::sync::Arc;
use std::thread;

use crate::barrier::{Barrier, BarrierVariant, SenseBarrier, StepBarrier};
use crate::cc;
use crate::merge::{merge_dn, merge_up};
use crate::shared_segments::SegmentsMut;
use crate::stage::{PerSegmentStageCounter, PerThreadStageCounter};
use crate::task_queue::ConcurrentTaskQueue;
use crate::wait::{WaitPolicy, WaitStrategyObj};

/// Coordination strategy for the bitonic merging network (§4.5.2).
#[derive(Debug, Clone, Copy)]
pub enum SortMode {
    /// M1: one thread, no shared state.
    Sequential,
    /// M2: per-stage work distributed over an external parallel
    /// runtime's pool, joined implicitly at the end of each stage.
    ForkJoin,
    /// M3: static per-thread segment ownership, synchronized with a
    /// reusable barrier between stages.
    Barrier(BarrierVariant),
    /// M4: no barrier; per-segment atomic stage counters gate each
    /// merge directly.
    LockFree,
    /// M5: same static ownership as M3, but merges are enqueued as
    /// tasks and drained with peer-queue stealing. `wait_free` selects
    /// the per-thread-stage-counter refinement over the plain
    /// double-barrier scheme (§4.5.2 M5).
    Stealing {
        barrier_variant: BarrierVariant,
        wait_free: bool,
    },
}

/// A contiguous, disjoint run of segment indices owned by one worker
/// (§3 "WorkerBlock"). Assignment is static: `num_segments` must be
/// divisible by `num_threads`.
fn worker_block(thread_id: usize, num_threads: usize, num_segments: usize) -> Range<usize> {
    debug_assert_eq!(num_segments % num_threads, 0);
    let per_thread = num_segments / num_threads;
    let start = thread_id * per_thread;
    start..(start + per_thread)
}

/// The `(k, j)` pairs of the bitonic merging network, in execution
/// order, for `num_segments` segments (§4.5.1).
fn bitonic_stages(num_segments: usize) -> Vec<(usize, usize)> {
    let mut stages = Vec::new();
    let mut k = 2;
    while k <= num_segments {
        let mut j = k / 2;
        while j >= 1 {
            stages.push((k, j));
            j /= 2;
        }
        k *= 2;
    }
    stages
}

#[inline]
fn merge_pair<T: PartialOrd + Copy>(a: &mut [T], b: &mut [T], buf: &mut [T], k: usize, i: usize) {
    if i & k == 0 {
        merge_up(a, b, buf);
    } else {
        merge_dn(a, b, buf);
    }
}

/// Sorts `data` in place in ascending order (§4.5, public contract).
///
/// # Preconditions
///
/// - `data.len()` is a positive multiple of `segment_size`.
/// - `segment_size` and `data.len() / segment_size` are powers of two.
/// - `data.len() / segment_size` is divisible by `num_threads` (ignored
///   for [`SortMode::Sequential`]).
///
/// Violating these is a contract violation per §7: this function does
/// not validate them beyond `debug_assert`, and the result is undefined
/// (most likely a panic from an out-of-bounds slice, or a hang).
pub fn sort<T>(data: &mut [T], mode: SortMode, num_threads: usize, segment_size: usize, wait_policy: WaitPolicy)
where
    T: Ord + Copy + Default + Send + Sync,
{
    assert!(segment_size > 0 && data.len() % segment_size == 0);
    let num_segments = data.len() / segment_size;
    debug_assert!(cc::checked_log2(segment_size).is_some());
    let num_segments_lg2 = cc::checked_log2(num_segments);
    debug_assert!(num_segments_lg2.is_some());
    // §4.5.1: (log2 num_segments) * (log2 num_segments + 1) / 2 merge
    // stages, plus the local-sort stage folded into each mode's step 1.
    debug_assert_eq!(bitonic_stages(num_segments).len(), {
        let lg = num_segments_lg2.unwrap_or(0) as usize;
        lg * (lg + 1) / 2
    });

    match mode {
        SortMode::Sequential => sort_sequential(data, segment_size),
        SortMode::ForkJoin => sort_fork_join(data, segment_size, num_threads),
        SortMode::Barrier(variant) => {
            sort_barrier(data, segment_size, num_threads, variant, wait_policy)
        }
        SortMode::LockFree => sort_lock_free(data, segment_size, num_threads, wait_policy),
        SortMode::Stealing {
            barrier_variant,
            wait_free,
        } => sort_stealing(
            data,
            segment_size,
            num_threads,
            barrier_variant,
            wait_policy,
            wait_free,
        ),
    }
}

fn make_barrier(variant: BarrierVariant) -> Arc<dyn Barrier> {
    match variant {
        BarrierVariant::Sense => Arc::new(SenseBarrier::new()),
        BarrierVariant::Step => Arc::new(StepBarrier::new()),
    }
}

// ---------------------------------------------------------------------
// M1: sequential
// ---------------------------------------------------------------------

fn sort_sequential<T: Ord + Copy + Default>(data: &mut [T], segment_size: usize) {
    let num_segments = data.len() / segment_size;
    for seg in data.chunks_mut(segment_size) {
        seg.sort();
    }
    let mut buf = vec![T::default(); 2 * segment_size];
    let segs = SegmentsMut::new(data, segment_size);
    for (k, j) in bitonic_stages(num_segments) {
        for i in 0..num_segments {
            let ij = i ^ j;
            if i < ij {
                // Safety: single thread, one pair touched at a time.
                let a = unsafe { segs.segment_mut(i) };
                let b = unsafe { segs.segment_mut(ij) };
                merge_pair(a, b, &mut buf, k, i);
            }
        }
    }
}

// ---------------------------------------------------------------------
// M2: fork-join over an external parallel runtime
// ---------------------------------------------------------------------

fn sort_fork_join<T: Ord + Copy + Default + Send + Sync>(
    data: &mut [T],
    segment_size: usize,
    num_threads: usize,
) {
    use rayon::iter::{IntoParallelIterator, ParallelIterator};

    let num_segments = data.len() / segment_size;
    let segs = SegmentsMut::new(data, segment_size);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads.max(1))
        .build()
        .expect("failed to build the fork-join thread pool");

    pool.install(|| {
        // Step 1 (local sort), distributed; the parallel iterator's
        // completion is the implicit join for this stage.
        (0..num_segments).into_par_iter().for_each(|seg_id| {
            let seg = unsafe { segs.segment_mut(seg_id) };
            seg.sort();
        });

        for (k, j) in bitonic_stages(num_segments) {
            (0..num_segments).into_par_iter().for_each(|i| {
                let ij = i ^ j;
                if i < ij {
                    let mut buf = vec![T::default(); 2 * segment_size];
                    let a = unsafe { segs.segment_mut(i) };
                    let b = unsafe { segs.segment_mut(ij) };
                    merge_pair(a, b, &mut buf, k, i);
                }
            });
        }
    });
}

// ---------------------------------------------------------------------
// M3: barrier-synchronized
// ---------------------------------------------------------------------

fn sort_barrier<T: Ord + Copy + Default + Send + Sync>(
    data: &mut [T],
    segment_size: usize,
    num_threads: usize,
    variant: BarrierVariant,
    wait_policy: WaitPolicy,
) {
    let num_segments = data.len() / segment_size;
    let segs = SegmentsMut::new(data, segment_size);
    let barrier = make_barrier(variant);
    let stages = bitonic_stages(num_segments);

    thread::scope(|scope| {
        for t in 0..num_threads {
            let segs = &segs;
            let barrier = barrier.clone();
            let stages = &stages;
            scope.spawn(move || {
                let range = worker_block(t, num_threads, num_segments);
                let mut buf = vec![T::default(); 2 * segment_size];
                let mut strategy = wait_policy.build();

                for seg_id in range.clone() {
                    let seg = unsafe { segs.segment_mut(seg_id) };
                    seg.sort();
                }
                barrier.wait(num_threads, strategy.as_mut());

                for &(k, j) in stages.iter() {
                    for i in range.clone() {
                        let ij = i ^ j;
                        if i < ij {
                            let a = unsafe { segs.segment_mut(i) };
                            let b = unsafe { segs.segment_mut(ij) };
                            merge_pair(a, b, &mut buf, k, i);
                        }
                    }
                    barrier.wait(num_threads, strategy.as_mut());
                }
            });
        }
    });
}

// ---------------------------------------------------------------------
// M4: lock-free, per-segment stage counters
// ---------------------------------------------------------------------

fn sort_lock_free<T: Ord + Copy + Default + Send + Sync>(
    data: &mut [T],
    segment_size: usize,
    num_threads: usize,
    wait_policy: WaitPolicy,
) {
    let num_segments = data.len() / segment_size;
    let segs = SegmentsMut::new(data, segment_size);
    let counters = PerSegmentStageCounter::new(num_segments);
    let stages = bitonic_stages(num_segments);

    thread::scope(|scope| {
        for t in 0..num_threads {
            let segs = &segs;
            let counters = &counters;
            let stages = &stages;
            scope.spawn(move || {
                let range = worker_block(t, num_threads, num_segments);
                let mut buf = vec![T::default(); 2 * segment_size];
                let mut strategy = wait_policy.build();

                // Stage 0: local sort. No cross-segment dependency, so
                // no wait is needed before it, only after, so peers
                // merging against one of these segments can observe it.
                for seg_id in range.clone() {
                    let seg = unsafe { segs.segment_mut(seg_id) };
                    seg.sort();
                    counters.advance(seg_id);
                }

                let mut my_stage = 1usize;
                for &(k, j) in stages.iter() {
                    for i in range.clone() {
                        let ij = i ^ j;
                        if i < ij {
                            counters.wait_for(i, my_stage, strategy.as_mut());
                            counters.wait_for(ij, my_stage, strategy.as_mut());
                            let a = unsafe { segs.segment_mut(i) };
                            let b = unsafe { segs.segment_mut(ij) };
                            merge_pair(a, b, &mut buf, k, i);
                            counters.advance(i);
                            counters.advance(ij);
                        }
                    }
                    my_stage += 1;
                }
            });
        }
    });

    // §8 #6: every segment must have completed every stage by the time
    // all workers have joined, with no straggler left mid-phase.
    let final_stage = stages.len() + 1;
    for seg in 0..num_segments {
        debug_assert_eq!(counters.get(seg), final_stage);
    }
}

// ---------------------------------------------------------------------
// M5: work-stealing
// ---------------------------------------------------------------------

/// Drains `queue` into the caller, and once it is empty, helps peers by
/// stealing from their queues in round-robin order starting at
/// `self_id + 1` until told to stop checking via `should_steal`.
fn steal_round_robin(
    self_id: usize,
    num_threads: usize,
    queues: &[ConcurrentTaskQueue],
    mut should_steal: impl FnMut() -> bool,
) {
    while should_steal() {
        let mut stole_any = false;
        for offset in 1..num_threads {
            let peer = (self_id + offset) % num_threads;
            if let Some(task) = queues[peer].pop() {
                task();
                stole_any = true;
            }
            if !should_steal() {
                return;
            }
        }
        if !stole_any {
            // Nothing stealable anywhere right now; let the caller's
            // exit condition (a barrier or a stage-counter check)
            // decide whether to keep spinning.
            return;
        }
    }
}

fn sort_stealing<T: Ord + Copy + Default + Send + Sync>(
    data: &mut [T],
    segment_size: usize,
    num_threads: usize,
    barrier_variant: BarrierVariant,
    wait_policy: WaitPolicy,
    wait_free: bool,
) {
    let num_segments = data.len() / segment_size;
    let segs = SegmentsMut::new(data, segment_size);
    let stages = bitonic_stages(num_segments);
    let queues: Vec<ConcurrentTaskQueue> = (0..num_threads).map(|_| ConcurrentTaskQueue::new()).collect();
    let barrier = make_barrier(barrier_variant);
    let thread_stages = PerThreadStageCounter::new(num_threads);

    thread::scope(|scope| {
        for t in 0..num_threads {
            let segs = &segs;
            let barrier = barrier.clone();
            let stages = &stages;
            let queues = &queues;
            let thread_stages = &thread_stages;
            scope.spawn(move || {
                let range = worker_block(t, num_threads, num_segments);
                let mut plain_strategy = wait_policy.build();

                for seg_id in range.clone() {
                    let seg = unsafe { segs.segment_mut(seg_id) };
                    seg.sort();
                }
                barrier.wait(num_threads, plain_strategy.as_mut());

                for &(k, j) in stages.iter() {
                    for i in range.clone() {
                        let ij = i ^ j;
                        if i < ij {
                            let segs = *segs;
                            queues[t].push(Box::new(move || {
                                let mut buf = vec![T::default(); 2 * segment_size];
                                // Safety: this pair is merged exactly
                                // once per stage across every queue.
                                let a = unsafe { segs.segment_mut(i) };
                                let b = unsafe { segs.segment_mut(ij) };
                                merge_pair(a, b, &mut buf, k, i);
                            }));
                        }
                    }

                    // First wait: every worker has finished enqueueing
                    // this stage's tasks before anyone starts stealing
                    // (the spec's stricter reading of the double-wait).
                    barrier.wait(num_threads, plain_strategy.as_mut());

                    while let Some(task) = queues[t].pop() {
                        task();
                    }

                    if wait_free {
                        // Wait-free refinement: a per-thread stage
                        // counter stands in for the second barrier.
                        // Publishing scratch-buffer writes from a
                        // stolen task to the stealer's view needs an
                        // explicit acquire fence, since the steal itself
                        // only synchronizes through the queue's mutex.
                        thread_stages.advance(t);
                        loop {
                            let mut all_caught_up = true;
                            for peer in 0..num_threads {
                                if peer == t {
                                    continue;
                                }
                                if thread_stages.may_steal_from(t, peer) {
                                    if let Some(task) = queues[peer].pop() {
                                        std::sync::atomic::fence(std::sync::atomic::Ordering::Acquire);
                                        task();
                                    } else {
                                        all_caught_up = false;
                                    }
                                }
                            }
                            if all_caught_up {
                                break;
                            }
                            plain_strategy.spin_once();
                        }
                    } else {
                        // Second wait: drained already, so spend the
                        // wait stealing from slower peers instead of
                        // idling.
                        let mut steal_while_waiting = || {
                            steal_round_robin(t, num_threads, queues, || true);
                        };
                        barrier.wait(num_threads, &mut steal_while_waiting);
                    }
                }
            });
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wait::WaitPolicy;

    fn run_all_modes(input: &[i32], segment_size: usize, num_threads: usize) {
        let expected = {
            let mut v = input.to_vec();
            v.sort();
            v
        };

        let modes = [
            SortMode::Sequential,
            SortMode::ForkJoin,
            SortMode::Barrier(BarrierVariant::Sense),
            SortMode::Barrier(BarrierVariant::Step),
            SortMode::LockFree,
            SortMode::Stealing {
                barrier_variant: BarrierVariant::Sense,
                wait_free: false,
            },
            SortMode::Stealing {
                barrier_variant: BarrierVariant::Sense,
                wait_free: true,
            },
        ];

        for mode in modes {
            let mut data = input.to_vec();
            sort(&mut data, mode, num_threads, segment_size, WaitPolicy::Yield);
            assert_eq!(data, expected, "mode mismatch");

            // Permutation property (§8 #1).
            let mut sorted_input = input.to_vec();
            sorted_input.sort();
            let mut sorted_output = data.clone();
            sorted_output.sort();
            assert_eq!(sorted_input, sorted_output);
        }
    }

    #[test]
    fn test_bitonic_stage_count() {
        // log2(n) * (log2(n)+1) / 2 stages for n = 8 -> 3*4/2 = 6
        assert_eq!(bitonic_stages(8).len(), 6);
        assert_eq!(bitonic_stages(4).len(), 3);
        assert_eq!(bitonic_stages(1).len(), 0);
    }

    #[test]
    fn test_worker_block_partitions_disjointly() {
        let blocks: Vec<_> = (0..4).map(|t| worker_block(t, 4, 16)).collect();
        let mut seen = vec![false; 16];
        for block in blocks {
            for i in block {
                assert!(!seen[i]);
                seen[i] = true;
            }
        }
        assert!(seen.iter().all(|&b| b));
    }

    // S1
    #[test]
    fn test_s1_sequential() {
        let mut data = vec![5, 7, 1, 4, 8, 2, 3, 6];
        sort(&mut data, SortMode::Sequential, 1, 2, WaitPolicy::Yield);
        assert_eq!(data, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    // S2
    #[test]
    fn test_s2_barrier_sense() {
        let mut data = vec![5, 7, 1, 4, 8, 2, 3, 6];
        sort(
            &mut data,
            SortMode::Barrier(BarrierVariant::Sense),
            2,
            2,
            WaitPolicy::Yield,
        );
        assert_eq!(data, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    // S3
    #[test]
    fn test_s3_lock_free() {
        let mut data = vec![5, 7, 1, 4, 8, 2, 3, 6];
        sort(&mut data, SortMode::LockFree, 2, 2, WaitPolicy::Yield);
        assert_eq!(data, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_all_modes_small() {
        run_all_modes(&[5, 7, 1, 4, 8, 2, 3, 6], 2, 2);
    }

    #[test]
    fn test_all_modes_single_thread() {
        run_all_modes(&[5, 7, 1, 4, 8, 2, 3, 6], 2, 1);
    }

    // S4, scaled down from 2^20/1024/16 to keep unit-test runtime sane;
    // the full-scale scenario lives in tests/sort.rs.
    #[test]
    fn test_s4_shaped_random_all_modes() {
        let mut input: Vec<i32> = (0..4096).collect();
        // deterministic shuffle so the test is reproducible
        let mut seed = 0x2545F4914F6CDD1Du64;
        for i in (1..input.len()).rev() {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let j = (seed as usize) % (i + 1);
            input.swap(i, j);
        }
        run_all_modes(&input, 64, 8);
    }

    #[test]
    fn test_determinism_across_modes_same_output() {
        let input: Vec<i32> = vec![9, 1, 8, 2, 7, 3, 6, 4, 5, 0, 15, 14, 13, 12, 11, 10];
        let expected = {
            let mut v = input.clone();
            v.sort();
            v
        };
        run_all_modes(&input, 4, 4);
        let _ = expected;
    }
}
