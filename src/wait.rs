//! Spin-wait strategies (C1).
//!
//! A [`WaitStrategy`] is the action a spinning thread performs on every
//! iteration of a spin loop: inside [`crate::barrier`] waits and inside
//! the per-segment stage-counter spins of the lock-free sort modes
//! (§4.5.2 M4/M5).
//!
//! Three named strategies are provided. Arbitrary closures are also
//! strategies, which is what lets the work-stealing sort mode (M5)
//! interleave steal attempts with barrier waits: the closure mutates the
//! calling thread's task-queue view on every spin iteration instead of
//! just burning cycles.

use crate::pr;

/// An action invoked on every iteration of a spin-wait loop.
///
/// Implemented for `Fn()` closures as well as the three named strategies
/// below, so a caller can pass a closure that performs productive work
/// (e.g. stealing a task from a peer) while it waits.
pub trait WaitStrategy {
    /// Perform one spin-loop iteration's worth of work.
    fn spin_once(&mut self);
}

impl<F: FnMut()> WaitStrategy for F {
    #[inline]
    fn spin_once(&mut self) {
        self()
    }
}

/// Spins at full CPU with no yielding or hinting. Lowest latency,
/// highest power draw; best when the expected wait is very short.
#[derive(Debug, Default, Clone, Copy)]
pub struct Burn;

impl WaitStrategy for Burn {
    #[inline]
    fn spin_once(&mut self) {}
}

/// Asks the OS scheduler to deschedule the caller briefly on every
/// iteration. Default wait policy per §4.7.
#[derive(Debug, Default, Clone, Copy)]
pub struct Yield;

impl WaitStrategy for Yield {
    #[inline]
    fn spin_once(&mut self) {
        std::thread::yield_now();
    }
}

/// Emits the CPU's spin-loop hint (`pause` on x86, `yield` on aarch64)
/// on every iteration. Reduces pipeline speculation and power
/// consumption without giving up the core like [`Yield`] does.
#[derive(Debug, Default, Clone, Copy)]
pub struct Pause;

impl WaitStrategy for Pause {
    #[inline]
    fn spin_once(&mut self) {
        pr::stall();
    }
}

/// Symbolic tag for the three named strategies, used by configuration
/// intake (§4.7) and the CLI surface (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum WaitPolicy {
    Burn,
    #[default]
    Yield,
    Pause,
}

impl WaitPolicy {
    /// Construct the concrete strategy this policy names.
    pub fn build(self) -> Box<dyn WaitStrategyObj> {
        match self {
            WaitPolicy::Burn => Box::new(Burn),
            WaitPolicy::Yield => Box::new(Yield),
            WaitPolicy::Pause => Box::new(Pause),
        }
    }
}

impl std::str::FromStr for WaitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "burn" => Ok(WaitPolicy::Burn),
            "yield" => Ok(WaitPolicy::Yield),
            "pause" => Ok(WaitPolicy::Pause),
            other => Err(format!("unrecognized wait policy {other:?}")),
        }
    }
}

/// Object-safe counterpart of [`WaitStrategy`], needed because named
/// policies are selected dynamically at runtime from configuration.
pub trait WaitStrategyObj {
    /// See [`WaitStrategy::spin_once`].
    fn spin_once(&mut self);
}

impl<T: WaitStrategy> WaitStrategyObj for T {
    #[inline]
    fn spin_once(&mut self) {
        WaitStrategy::spin_once(self)
    }
}

impl WaitStrategy for Box<dyn WaitStrategyObj> {
    #[inline]
    fn spin_once(&mut self) {
        (**self).spin_once()
    }
}
