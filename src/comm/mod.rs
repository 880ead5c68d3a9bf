//! Inter-host transport abstraction.
//!
//! The partitioner talks to peers through [`Transport`]: tagged reliable
//! FIFO messaging per ordered (source, destination, phase) triple, with a
//! non-blocking receive. One *phase* is one all-to-all exchange; the
//! [`PhaseCounter`] is advanced once per exchange so stale messages from a
//! previous phase can never be confused with the current one.
//!
//! Two backends ship with the crate: [`NoComm`] for single-host runs and
//! [`MemoryTransport`] for in-process multi-rank clusters (one std thread
//! per rank), which is how the multi-host test suite runs.

pub mod wire;

use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use wire::WireBuf;

/// Tagged reliable messaging between hosts.
///
/// Sends are buffered-at-latest by `flush`; receives are non-blocking and
/// return any queued message for `(self, phase)`. Implementations must
/// deliver messages of one ordered pair in send order.
pub trait Transport: Send + Sync {
    /// Rank of this host in `[0, size)`.
    fn rank(&self) -> usize;
    /// Total number of hosts.
    fn size(&self) -> usize;
    /// Queue `buf` for delivery to `dest` under `phase`.
    fn send_tagged(&self, dest: usize, phase: u32, buf: WireBuf);
    /// Take one queued message for this host under `phase`, if any.
    fn recv_tagged(&self, phase: u32) -> Option<(usize, Vec<u8>)>;
    /// Push out any locally buffered sends.
    fn flush(&self) {}
    /// Synchronise all hosts.
    fn barrier(&self);
}

/// Explicit handle for the exchange-phase counter.
///
/// The original runtime kept this as process-global mutable state
/// (`evilPhase`); here the partitioner owns one and threads it through
/// every exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseCounter(u32);

impl PhaseCounter {
    /// Counter starting at phase 1 (phase 0 is reserved as "never sent").
    pub fn new() -> Self {
        Self(1)
    }

    /// Phase tag for the exchange currently in flight.
    #[inline]
    pub fn current(&self) -> u32 {
        self.0
    }

    /// Move to the next phase. Call exactly once per completed all-to-all.
    #[inline]
    pub fn advance(&mut self) {
        self.0 += 1;
    }
}

impl Default for PhaseCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Transport for a single-host run: no peers, nothing to deliver.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoComm;

impl Transport for NoComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn send_tagged(&self, _dest: usize, _phase: u32, _buf: WireBuf) {}

    fn recv_tagged(&self, _phase: u32) -> Option<(usize, Vec<u8>)> {
        None
    }

    fn barrier(&self) {}
}

struct EpochBarrier {
    arrived: usize,
    epoch: usize,
}

struct ClusterShared {
    size: usize,
    // keyed by (destination rank, phase); values carry the source rank
    mail: Mutex<HashMap<(usize, u32), VecDeque<(usize, Vec<u8>)>>>,
    barrier: Mutex<EpochBarrier>,
    barrier_cv: Condvar,
}

/// In-process transport: `cluster(n)` yields one endpoint per rank, all
/// sharing a mailbox. Endpoints are handed to one thread each.
#[derive(Clone)]
pub struct MemoryTransport {
    rank: usize,
    shared: Arc<ClusterShared>,
}

impl MemoryTransport {
    /// Build an `n`-rank cluster. Endpoint `i` is rank `i`.
    pub fn cluster(n: usize) -> Vec<MemoryTransport> {
        assert!(n > 0, "cluster needs at least one rank");
        let shared = Arc::new(ClusterShared {
            size: n,
            mail: Mutex::new(HashMap::new()),
            barrier: Mutex::new(EpochBarrier { arrived: 0, epoch: 0 }),
            barrier_cv: Condvar::new(),
        });
        (0..n)
            .map(|rank| MemoryTransport {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect()
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("rank", &self.rank)
            .field("size", &self.shared.size)
            .finish()
    }
}

impl Transport for MemoryTransport {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn send_tagged(&self, dest: usize, phase: u32, buf: WireBuf) {
        debug_assert!(dest < self.shared.size && dest != self.rank);
        let mut mail = self.shared.mail.lock();
        mail.entry((dest, phase))
            .or_default()
            .push_back((self.rank, buf.into_bytes()));
    }

    fn recv_tagged(&self, phase: u32) -> Option<(usize, Vec<u8>)> {
        let mut mail = self.shared.mail.lock();
        mail.get_mut(&(self.rank, phase))?.pop_front()
    }

    fn barrier(&self) {
        let mut b = self.shared.barrier.lock();
        let epoch = b.epoch;
        b.arrived += 1;
        if b.arrived == self.shared.size {
            b.arrived = 0;
            b.epoch += 1;
            self.shared.barrier_cv.notify_all();
        } else {
            while b.epoch == epoch {
                self.shared.barrier_cv.wait(&mut b);
            }
        }
    }
}
