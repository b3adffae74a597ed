//! Reusable thread barriers (C2).
//!
//! Two variants, both correct under concurrent reuse and both built from
//! the same two cache-line-isolated atomics: a `spinning` arrival counter
//! and an `epoch` word that late arrivers use to detect a release they
//! may have missed.
//!
//! [`SenseBarrier`] flips the sign bit of `epoch` on release ("sense
//! reversal"); [`StepBarrier`] increments it. Both rely on the atomic
//! fetch-add's defined wraparound (unsigned overflow on `AtomicUsize`
//! never panics, release or debug), so an unbounded sequence of phases
//! is safe even once `epoch` wraps.
//!
//! The memory-order contract (§4.2): operations completed by any thread
//! before it returns from `wait` in phase *k* are visible to every
//! thread after *it* returns from `wait` in phase *k*. The release
//! store of `epoch` by the last arrival synchronizes-with the acquire
//! load every waiter performs before leaving its spin loop.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::cache_padded::CachePadded;
use crate::wait::WaitStrategyObj;

/// Common barrier contract: block the caller until exactly `num_threads`
/// distinct callers have invoked `wait` in the same phase.
///
/// A single instance serves an unbounded sequence of phases, including
/// phases that declare a different `num_threads` than the phase before
/// (§4.2 "Correctness under heterogeneous num_threads"), provided
/// exactly that many threads call `wait` before any of them starts the
/// next phase. Fewer callers than declared hangs the barrier; this is a
/// caller contract violation, not a detected error (§7).
pub trait Barrier: Send + Sync {
    /// Block until `num_threads` callers have arrived at this phase,
    /// driving `strategy` on every spin iteration while waiting.
    fn wait(&self, num_threads: usize, strategy: &mut dyn WaitStrategyObj);
}

/// Sense-reversing barrier (§4.2.1).
pub struct SenseBarrier {
    spinning: CachePadded<AtomicUsize>,
    epoch: CachePadded<AtomicUsize>,
}

impl SenseBarrier {
    /// Creates a barrier at quiescence (`spinning == 0`).
    pub const fn new() -> Self {
        Self {
            spinning: CachePadded::new(AtomicUsize::new(0)),
            epoch: CachePadded::new(AtomicUsize::new(0)),
        }
    }
}

impl Default for SenseBarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl Barrier for SenseBarrier {
    fn wait(&self, num_threads: usize, strategy: &mut dyn WaitStrategyObj) {
        debug_assert!(num_threads > 0);
        let local = self.epoch.load(Ordering::Acquire);
        let arrived = self.spinning.fetch_add(1, Ordering::AcqRel);

        if arrived < num_threads - 1 {
            while self.epoch.load(Ordering::Acquire) == local {
                strategy.spin_once();
            }
        } else {
            self.spinning.store(0, Ordering::Relaxed);
            self.epoch.store(!local, Ordering::Release);
        }
    }
}

/// Step (monotonic-counter) barrier (§4.2.2).
pub struct StepBarrier {
    spinning: CachePadded<AtomicUsize>,
    epoch: CachePadded<AtomicUsize>,
}

impl StepBarrier {
    /// Creates a barrier at quiescence (`spinning == 0`).
    pub const fn new() -> Self {
        Self {
            spinning: CachePadded::new(AtomicUsize::new(0)),
            epoch: CachePadded::new(AtomicUsize::new(0)),
        }
    }
}

impl Default for StepBarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl Barrier for StepBarrier {
    fn wait(&self, num_threads: usize, strategy: &mut dyn WaitStrategyObj) {
        debug_assert!(num_threads > 0);
        let local = self.epoch.load(Ordering::Acquire);
        let arrived = self.spinning.fetch_add(1, Ordering::AcqRel);

        if arrived < num_threads - 1 {
            while self.epoch.load(Ordering::Acquire) == local {
                strategy.spin_once();
            }
        } else {
            self.spinning.store(0, Ordering::Relaxed);
            self.epoch.fetch_add(1, Ordering::Release);
        }
    }
}

/// Symbolic tag for the two barrier variants (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BarrierVariant {
    #[default]
    Sense,
    Step,
}

impl std::str::FromStr for BarrierVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sense" => Ok(BarrierVariant::Sense),
            "step" => Ok(BarrierVariant::Step),
            other => Err(format!("unrecognized barrier variant {other:?}")),
        }
    }
}


/// Model-checked variant of the sense-reversing protocol, run under
/// `loom` to exhaustively explore thread interleavings rather than rely
/// on however the OS scheduler happens to order things on one run.
/// `loom`'s atomics aren't interchangeable with `std`'s, so this
/// re-expresses the same two-atomic algorithm from [`SenseBarrier`]
/// rather than exercising it directly.
#[cfg(loom)]
mod loom_tests {
    use loom::sync::atomic::{AtomicUsize, Ordering};
    use loom::sync::Arc;
    use loom::thread;

    struct ModelBarrier {
        spinning: AtomicUsize,
        epoch: AtomicUsize,
    }

    impl ModelBarrier {
        fn new() -> Self {
            Self {
                spinning: AtomicUsize::new(0),
                epoch: AtomicUsize::new(0),
            }
        }

        fn wait(&self, num_threads: usize) {
            let local = self.epoch.load(Ordering::Acquire);
            let arrived = self.spinning.fetch_add(1, Ordering::AcqRel);
            if arrived < num_threads - 1 {
                while self.epoch.load(Ordering::Acquire) == local {
                    loom::hint::spin_loop();
                }
            } else {
                self.spinning.store(0, Ordering::Relaxed);
                self.epoch.store(local + 1, Ordering::Release);
            }
        }
    }

    // Two threads, each writing before the barrier and reading the
    // other's write after, must never observe the pre-barrier value.
    #[test]
    fn model_barrier_orders_writes_before_reads() {
        loom::model(|| {
            let barrier = Arc::new(ModelBarrier::new());
            let x = Arc::new(AtomicUsize::new(0));
            let y = Arc::new(AtomicUsize::new(0));

            let b1 = barrier.clone();
            let x1 = x.clone();
            let y1 = y.clone();
            let t1 = thread::spawn(move || {
                x1.store(1, Ordering::Relaxed);
                b1.wait(2);
                y1.load(Ordering::Relaxed)
            });

            let b2 = barrier.clone();
            let x2 = x.clone();
            let y2 = y.clone();
            let t2 = thread::spawn(move || {
                y2.store(1, Ordering::Relaxed);
                b2.wait(2);
                x2.load(Ordering::Relaxed)
            });

            let r1 = t1.join().unwrap();
            let r2 = t2.join().unwrap();
            assert_eq!(r1, 1);
            assert_eq!(r2, 1);
        });
    }

    #[test]
    fn model_barrier_handles_three_participants() {
        loom::model(|| {
            let barrier = Arc::new(ModelBarrier::new());
            let handles: Vec<_> = (0..3)
                .map(|_| {
                    let b = barrier.clone();
                    thread::spawn(move || b.wait(3))
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
        });
    }
}
