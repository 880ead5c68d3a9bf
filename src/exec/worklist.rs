//! Worklist containers for the parallel executor.
//!
//! Any type with thread-safe non-blocking `push`/`pop` where `pop` can
//! return items pushed by any thread satisfies the executor; two policies
//! ship here. [`FifoWorklist`] is the default global list.
//! [`StealingWorklist`] keeps a FIFO per worker with cross-worker steal
//! fallback and backs the aborted-item retry list, so retries stay local
//! to the conflicting worker until the leader comes asking.

use std::collections::VecDeque;

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;

/// Multi-producer multi-consumer worklist.
pub trait Worklist<V>: Send + Sync {
    /// Add one item.
    fn push(&self, v: V);
    /// Take one item, if any. Never blocks.
    fn pop(&self) -> Option<V>;
}

/// Shared FIFO.
#[derive(Debug)]
pub struct FifoWorklist<V> {
    q: Mutex<VecDeque<V>>,
}

impl<V> Default for FifoWorklist<V> {
    fn default() -> Self {
        Self {
            q: Mutex::new(VecDeque::new()),
        }
    }
}

impl<V> FifoWorklist<V> {
    /// Fresh empty list.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<V: Send> Worklist<V> for FifoWorklist<V> {
    fn push(&self, v: V) {
        self.q.lock().push_back(v);
    }

    fn pop(&self) -> Option<V> {
        self.q.lock().pop_front()
    }
}

/// Per-worker FIFOs with steal fallback.
///
/// `push` targets the calling worker's slot; `pop` tries the own slot
/// first and then scans the others.
#[derive(Debug)]
pub struct StealingWorklist<V> {
    slots: Vec<CachePadded<Mutex<VecDeque<V>>>>,
}

impl<V> StealingWorklist<V> {
    /// One slot per worker.
    pub fn new(workers: usize) -> Self {
        let mut slots = Vec::with_capacity(workers.max(1));
        slots.resize_with(workers.max(1), || CachePadded::new(Mutex::new(VecDeque::new())));
        Self { slots }
    }

    fn my_slot(&self) -> usize {
        super::worker_id() % self.slots.len()
    }
}

impl<V: Send> Worklist<V> for StealingWorklist<V> {
    fn push(&self, v: V) {
        self.slots[self.my_slot()].lock().push_back(v);
    }

    fn pop(&self) -> Option<V> {
        let me = self.my_slot();
        if let Some(v) = self.slots[me].lock().pop_front() {
            return Some(v);
        }
        for (i, slot) in self.slots.iter().enumerate() {
            if i == me {
                continue;
            }
            if let Some(v) = slot.lock().pop_front() {
                return Some(v);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_orders_items() {
        let wl = FifoWorklist::new();
        wl.push(1);
        wl.push(2);
        assert_eq!(wl.pop(), Some(1));
        assert_eq!(wl.pop(), Some(2));
        assert_eq!(wl.pop(), None);
    }

    #[test]
    fn stealing_falls_back_to_other_slots() {
        let wl = StealingWorklist::new(4);
        crate::exec::set_worker_id(2);
        wl.push(7);
        crate::exec::set_worker_id(0);
        assert_eq!(wl.pop(), Some(7));
        assert_eq!(wl.pop(), None);
    }

    #[test]
    fn stealing_prefers_local_slot() {
        let wl = StealingWorklist::new(2);
        crate::exec::set_worker_id(1);
        wl.push(10);
        crate::exec::set_worker_id(0);
        wl.push(20);
        assert_eq!(wl.pop(), Some(20));
        assert_eq!(wl.pop(), Some(10));
    }

    #[test]
    fn concurrent_push_pop_loses_nothing() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let wl = StealingWorklist::new(4);
        let seen = AtomicUsize::new(0);
        std::thread::scope(|s| {
            for t in 0..4 {
                let (wl, seen) = (&wl, &seen);
                s.spawn(move || {
                    crate::exec::set_worker_id(t);
                    for i in 0..100 {
                        wl.push(t * 100 + i);
                    }
                    while wl.pop().is_some() {
                        seen.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });
        // stragglers left by racing pops
        while wl.pop().is_some() {
            seen.fetch_add(1, Ordering::Relaxed);
        }
        assert_eq!(seen.load(Ordering::Relaxed), 400);
    }
}
