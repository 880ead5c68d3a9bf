//! Token-ring termination detection.
//!
//! Each worker holds a `work_happened` flag it raises whenever it takes an
//! item. A probe token circulates the ring: a worker only advances the
//! token it holds, and only while locally idle (the executor calls
//! [`local_termination`](TerminationDetection::local_termination) strictly
//! between iterations). A worker that worked since its previous visit
//! blackens the token as it forwards it. When the initiator (worker 0)
//! gets the token back white and is itself clean, no work existed anywhere
//! after the probe began, and the terminated latch is set.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

/// Per-worker token-holder state.
#[derive(Debug, Default)]
pub struct TokenHolder {
    work: AtomicBool,
}

impl TokenHolder {
    /// Record that this worker took work since its last token visit.
    #[inline]
    pub fn work_happened(&self) {
        self.work.store(true, Ordering::Relaxed);
    }
}

/// Shared state of the termination protocol.
#[derive(Debug)]
pub struct TerminationDetection {
    holders: Vec<CachePadded<TokenHolder>>,
    token_pos: AtomicUsize,
    token_black: AtomicBool,
    probe_started: AtomicBool,
    terminated: AtomicBool,
}

impl TerminationDetection {
    /// Protocol over `workers` ring positions.
    pub fn new(workers: usize) -> Self {
        let mut holders = Vec::with_capacity(workers.max(1));
        holders.resize_with(workers.max(1), CachePadded::default);
        Self {
            holders,
            token_pos: AtomicUsize::new(0),
            token_black: AtomicBool::new(false),
            probe_started: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
        }
    }

    /// The calling worker's holder.
    #[inline]
    pub fn holder(&self, tid: usize) -> &TokenHolder {
        &self.holders[tid]
    }

    /// Offer to surrender the token. Call only while worker `tid` is idle
    /// (no iteration in flight); a no-op unless `tid` holds the token.
    pub fn local_termination(&self, tid: usize) {
        if self.terminated.load(Ordering::Acquire) {
            return;
        }
        if self.token_pos.load(Ordering::Acquire) != tid {
            return;
        }
        let dirty = self.holders[tid].work.swap(false, Ordering::AcqRel);
        if dirty {
            self.token_black.store(true, Ordering::Release);
        }
        if tid == 0 {
            let clean_circuit = self.probe_started.load(Ordering::Acquire)
                && !self.token_black.load(Ordering::Acquire);
            if clean_circuit {
                self.terminated.store(true, Ordering::Release);
                return;
            }
            // begin a fresh probe with a white token
            self.probe_started.store(true, Ordering::Release);
            self.token_black.store(false, Ordering::Release);
        }
        let next = (tid + 1) % self.holders.len();
        self.token_pos.store(next, Ordering::Release);
    }

    /// True once collective quiescence has been declared.
    #[inline]
    pub fn global_termination(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }
}
