//! Concurrent task queue (C3).
//!
//! A minimal mutex-guarded FIFO of zero-argument deferred actions, used
//! by the work-stealing sort modes (§4.5.2 M5) to hand merge work
//! between a worker's own queue and its peers'. Simpler than the
//! lock-free FIFOs elsewhere in this crate's lineage: the spec calls
//! for a single internal mutex, not a lock-free ring, since contention
//! here is bounded by `num_threads` rather than by arbitrary producer
//! counts.

use std::collections::VecDeque;
use std::sync::Mutex;

/// A deferred zero-argument action.
pub type Task = Box<dyn FnOnce() + Send>;

/// Thread-safe FIFO of [`Task`]s.
///
/// `push` never blocks except briefly on the internal mutex. `pop` is
/// non-blocking: an empty queue returns `None` immediately rather than
/// waiting for a producer.
pub struct ConcurrentTaskQueue {
    tasks: Mutex<VecDeque<Task>>,
}

impl ConcurrentTaskQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
        }
    }

    /// Appends `task` to the back of the queue.
    pub fn push(&self, task: Task) {
        self.tasks.lock().unwrap().push_back(task);
    }

    /// Removes and returns the task at the front of the queue, or
    /// `None` if the queue was empty at the moment of the call.
    pub fn pop(&self) -> Option<Task> {
        self.tasks.lock().unwrap().pop_front()
    }

    /// Returns `true` if the queue held no tasks at the moment of the
    /// call. Racy under concurrent pushers; intended for diagnostics
    /// and the stealing loop's "anything left?" check, not for
    /// correctness.
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().unwrap().is_empty()
    }

    /// Number of tasks currently queued. Same raciness caveat as
    /// [`Self::is_empty`].
    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }
}

impl Default for ConcurrentTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_pop_empty_returns_none() {
        let q = ConcurrentTaskQueue::new();
        assert!(q.pop().is_none());
        assert!(q.is_empty());
    }

    #[test]
    fn test_fifo_order() {
        let q = ConcurrentTaskQueue::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let order = order.clone();
            q.push(Box::new(move || order.lock().unwrap().push(i)));
        }

        while let Some(task) = q.pop() {
            task();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_len_tracks_pushes_and_pops() {
        let q = ConcurrentTaskQueue::new();
        assert_eq!(q.len(), 0);
        q.push(Box::new(|| {}));
        q.push(Box::new(|| {}));
        assert_eq!(q.len(), 2);
        q.pop();
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_each_task_popped_exactly_once_under_contention() {
        const N: usize = 2000;
        let q = Arc::new(ConcurrentTaskQueue::new());
        let executed = Arc::new(AtomicUsize::new(0));

        for _ in 0..N {
            let executed = executed.clone();
            q.push(Box::new(move || {
                executed.fetch_add(1, Ordering::Relaxed);
            }));
        }

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let q = q.clone();
                thread::spawn(move || {
                    let mut popped = 0;
                    while let Some(task) = q.pop() {
                        task();
                        popped += 1;
                    }
                    popped
                })
            })
            .collect();

        let total_popped: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total_popped, N);
        assert_eq!(executed.load(Ordering::Relaxed), N);
        assert!(q.is_empty());
    }
}
