//! # parasort
//!
//! Reusable concurrency primitives, and a segmented bitonic-merge sort
//! built on top of them to exercise five different ways of coordinating
//! a fixed-size pool of worker threads.
//!
//! ## Module Organization
//!
//! ### Foundation
//! - [`cc`] - Stage-count arithmetic used by the sort engine's precondition checks
//! - [`pr`] - Memory fences and the CPU pause hint
//!
//! ### Concurrency Primitives
//! - [`wait`] - Spin-wait strategies (burn / yield / pause)
//! - [`cache_padded`] - Cache-line isolation for hot atomics
//! - [`barrier`] - Reusable thread barriers (sense-reversing and step)
//! - [`task_queue`] - Mutex-guarded concurrent task queue
//!
//! ### Sorting Engine
//! - [`merge`] - In-place bitonic merge kernels
//! - [`stage`] - Lock-free per-segment / per-thread stage counters
//! - [`shared_segments`] - Cross-thread mutable access to disjoint segments
//! - [`sort`] - The five coordination strategies and the public `sort` entry point
//!
//! ### Configuration
//! - [`factory`] - Tag-keyed construction of barriers, queues, and sort modes
//! - [`config`] - CLI and environment configuration intake

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Stage-count arithmetic for the sort engine.
pub mod cc;

/// Memory fences and the CPU pause hint.
pub mod pr;

/// Spin-wait strategies.
pub mod wait;

/// Cache-line padding for hot atomics.
pub mod cache_padded;

/// Reusable thread barriers.
pub mod barrier;

/// Concurrent task queue.
pub mod task_queue;

/// In-place bitonic merge kernels.
pub mod merge;

/// Lock-free stage-counter coordination state.
pub mod stage;

/// Cross-thread mutable access to disjoint segments.
pub mod shared_segments;

/// The segmented bitonic-merge sort engine.
pub mod sort;

/// Tag-keyed construction of primitives and sort modes.
pub mod factory;

/// Configuration intake.
pub mod config;

pub use barrier::{Barrier, BarrierVariant, SenseBarrier, StepBarrier};
pub use sort::{sort, SortMode};
pub use task_queue::{ConcurrentTaskQueue, Task};
pub use wait::{WaitPolicy, WaitStrategy, WaitStrategyObj};
