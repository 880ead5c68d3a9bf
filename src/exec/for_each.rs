//! The speculative for-each engine.
//!
//! `run` executes two barrier-separated phases on a pool of worker
//! threads: a fill phase that statically chunks the initial range onto the
//! global worklist, and the main loop. Within the main loop each worker
//! repeats: pop an item, run the operator, commit or roll back, and (on
//! the leader only) drain the aborted retry list. Worker 0 is the leader;
//! keeping the retry drain single-threaded serialises the contended path
//! and guarantees the leader makes progress under heavy conflict load.

use std::sync::atomic::{fence, AtomicBool, Ordering};
use std::sync::Barrier;

use crossbeam_utils::CachePadded;

use super::context::{Conflict, LoopStatistics, UserContext};
use super::termination::TerminationDetection;
use super::worklist::{FifoWorklist, StealingWorklist, Worklist};

/// A loop body run once per work item.
///
/// The associated consts let the executor elide bookkeeping the operator
/// does not need; they affect performance only, with one exception: break
/// requests are honoured only when `NEEDS_BREAK` is set. Defaults match
/// the common cautious operator.
pub trait Operator<V>: Sync {
    /// Count iterations and conflicts.
    const COLLECT_STATS: bool = true;
    /// Honour [`UserContext::request_break`].
    const NEEDS_BREAK: bool = false;
    /// Drain the context push buffer into the worklist after each commit.
    const NEEDS_PUSH: bool = true;
    /// Track acquired locks across the iteration (off for operators that
    /// never call [`UserContext::lock`]).
    const NEEDS_CONTEXT: bool = true;
    /// Reset the per-iteration arena after each iteration.
    const NEEDS_PIA: bool = false;

    /// Process one item. `Err(Conflict)` rolls the iteration back and
    /// retries the item later.
    fn call(&self, item: V, ctx: &mut UserContext<V>) -> Result<(), Conflict>;
}

/// Blanket operator for plain closures: no break, no conflicts.
impl<V, F> Operator<V> for F
where
    F: Fn(V, &mut UserContext<V>) + Sync,
{
    fn call(&self, item: V, ctx: &mut UserContext<V>) -> Result<(), Conflict> {
        self(item, ctx);
        Ok(())
    }
}

/// Executor tunables.
#[derive(Debug, Clone)]
pub struct ExecConfig {
    /// Worker threads in the loop's pool.
    pub threads: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

struct WorkerState<V> {
    ctx: UserContext<V>,
    stat: LoopStatistics,
}

/// One parallel loop instance: operator, worklists, flags, termination.
pub struct ForEach<V, O, W = FifoWorklist<V>> {
    op: O,
    loopname: String,
    threads: usize,
    global: W,
    aborted: StealingWorklist<V>,
    break_happened: CachePadded<AtomicBool>,
    abort_happened: CachePadded<AtomicBool>,
    term: TerminationDetection,
}

impl<V, O> ForEach<V, O, FifoWorklist<V>>
where
    V: Clone + Send + Sync,
    O: Operator<V>,
{
    /// Loop over the default FIFO global worklist.
    pub fn new(op: O, loopname: &str, config: &ExecConfig) -> Self {
        Self::with_worklist(op, loopname, FifoWorklist::new(), config)
    }
}

impl<V, O, W> ForEach<V, O, W>
where
    V: Clone + Send + Sync,
    O: Operator<V>,
    W: Worklist<V>,
{
    /// Loop over a caller-supplied global worklist.
    pub fn with_worklist(op: O, loopname: &str, worklist: W, config: &ExecConfig) -> Self {
        let threads = config.threads.max(1);
        Self {
            op,
            loopname: loopname.to_owned(),
            threads,
            global: worklist,
            aborted: StealingWorklist::new(threads),
            break_happened: CachePadded::new(AtomicBool::new(false)),
            abort_happened: CachePadded::new(AtomicBool::new(false)),
            term: TerminationDetection::new(threads),
        }
    }

    /// Run the loop over every accepted item of `initial` plus everything
    /// the operator pushes. Returns the merged loop statistics.
    pub fn run<F>(&self, initial: &[V], filter: F) -> LoopStatistics
    where
        F: Fn(&V) -> bool + Sync,
    {
        let barrier = Barrier::new(self.threads);
        // round-up chunking keeps every worker's fill slice contiguous
        let chunk = initial.len().div_ceil(self.threads);

        let mut total = LoopStatistics::default();
        std::thread::scope(|s| {
            let mut handles = Vec::with_capacity(self.threads);
            for tid in 0..self.threads {
                let (barrier, filter) = (&barrier, &filter);
                handles.push(s.spawn(move || {
                    super::set_worker_id(tid);
                    let lo = (chunk * tid).min(initial.len());
                    let hi = (chunk * (tid + 1)).min(initial.len());
                    for v in &initial[lo..hi] {
                        if filter(v) {
                            self.global.push(v.clone());
                        }
                    }
                    barrier.wait();
                    self.go(tid)
                }));
            }
            for h in handles {
                total.merge(h.join().expect("worker panicked"));
            }
        });
        total.report(&self.loopname);
        total
    }

    fn go(&self, tid: usize) -> LoopStatistics {
        let leader = tid == 0;
        let mut tld = WorkerState {
            ctx: UserContext::new(tid),
            stat: LoopStatistics::default(),
        };

        'outer: loop {
            let mut p = self.global.pop();
            if p.is_some() {
                self.term.holder(tid).work_happened();
            }
            while let Some(v) = p {
                if O::NEEDS_BREAK && self.break_happened.load(Ordering::SeqCst) {
                    break 'outer;
                }
                self.do_process(v, &mut tld);
                if leader {
                    self.drain_aborted(tid, &mut tld);
                }
                p = self.global.pop();
            }

            if leader {
                self.drain_aborted(tid, &mut tld);
            }
            if O::NEEDS_BREAK && self.break_happened.load(Ordering::SeqCst) {
                break;
            }
            self.term.local_termination(tid);
            if self.term.global_termination() {
                break;
            }
            std::thread::yield_now();
        }
        tld.stat
    }

    fn do_process(&self, val: V, tld: &mut WorkerState<V>) {
        if O::COLLECT_STATS {
            tld.stat.inc_iterations();
        }
        if O::NEEDS_CONTEXT {
            tld.ctx.cnx.start_iteration();
        }
        let aborting = self.op.call(val.clone(), &mut tld.ctx).is_err();
        self.finish_iteration(aborting, val, tld);
    }

    fn finish_iteration(&self, aborting: bool, val: V, tld: &mut WorkerState<V>) {
        if aborting {
            if O::NEEDS_CONTEXT {
                tld.ctx.cnx.cancel_iteration();
            }
            if O::COLLECT_STATS {
                tld.stat.inc_conflicts();
            }
            // publish the rollback before the retry item becomes visible
            fence(Ordering::SeqCst);
            self.aborted.push(val);
            self.abort_happened.store(true, Ordering::SeqCst);
            // an aborted iteration neither breaks nor pushes
            tld.ctx.reset_break();
            tld.ctx.clear_push_buffer();
        }

        if O::NEEDS_PUSH {
            for v in tld.ctx.drain_push_buffer() {
                self.global.push(v);
            }
        }
        if O::NEEDS_PIA {
            tld.ctx.reset_arena();
        }
        if O::NEEDS_BREAK && tld.ctx.break_requested() {
            self.break_happened.store(true, Ordering::SeqCst);
        }
        if !aborting && O::NEEDS_CONTEXT {
            tld.ctx.cnx.commit_iteration();
        }
    }

    /// Leader-only retry drain; single-threaded by construction so heavy
    /// contention cannot livelock the retry path.
    fn drain_aborted(&self, tid: usize, tld: &mut WorkerState<V>) {
        if !self.abort_happened.load(Ordering::SeqCst) {
            return;
        }
        self.term.holder(tid).work_happened();
        self.abort_happened.store(false, Ordering::SeqCst);
        while let Some(v) = self.aborted.pop() {
            if O::NEEDS_BREAK && self.break_happened.load(Ordering::SeqCst) {
                return;
            }
            self.do_process(v, tld);
        }
    }
}

/// Run `op` over `initial` with an accept-all filter and default worklist.
pub fn for_each<V, O>(
    initial: &[V],
    op: O,
    loopname: &str,
    config: &ExecConfig,
) -> LoopStatistics
where
    V: Clone + Send + Sync,
    O: Operator<V>,
{
    ForEach::new(op, loopname, config).run(initial, |_| true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::sync::Mutex;

    #[test]
    fn processes_every_initial_item_once() {
        let seen = Mutex::new(Vec::new());
        let op = |v: u32, _ctx: &mut UserContext<u32>| {
            seen.lock().unwrap().push(v);
        };
        let items: Vec<u32> = (0..100).collect();
        let stats = for_each(&items, op, "count", &ExecConfig { threads: 4 });
        let mut got = seen.into_inner().unwrap();
        got.sort_unstable();
        assert_eq!(got, items);
        assert_eq!(stats.iterations, 100);
        assert_eq!(stats.conflicts, 0);
    }

    #[test]
    fn filter_rejects_items() {
        let count = AtomicU64::new(0);
        let op = |_v: u32, _ctx: &mut UserContext<u32>| {
            count.fetch_add(1, Ordering::Relaxed);
        };
        let items: Vec<u32> = (0..10).collect();
        let fe = ForEach::new(op, "evens", &ExecConfig { threads: 2 });
        fe.run(&items, |v| v % 2 == 0);
        assert_eq!(count.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn pushed_items_are_processed() {
        let sum = AtomicU64::new(0);
        let op = |v: u64, ctx: &mut UserContext<u64>| {
            sum.fetch_add(v, Ordering::Relaxed);
            if v < 8 {
                ctx.push(v * 2);
            }
        };
        // 1 -> 2 -> 4 -> 8, so the sum closes over the whole chain
        let stats = for_each(&[1u64], op, "chain", &ExecConfig { threads: 3 });
        assert_eq!(sum.load(Ordering::Relaxed), 1 + 2 + 4 + 8);
        assert_eq!(stats.iterations, 4);
    }

    #[test]
    fn empty_initial_terminates() {
        let op = |_v: u32, _ctx: &mut UserContext<u32>| {};
        let stats = for_each(&[], op, "empty", &ExecConfig { threads: 4 });
        assert_eq!(stats.iterations, 0);
    }
}
