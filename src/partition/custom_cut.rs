//! Custom edge cut: build one host's CSR subgraph from a shared graph file
//! and an externally supplied vertex→host assignment.
//!
//! Construction runs in two exchange phases, each one all-to-all under its
//! own phase tag:
//!
//! 1. **Edge inspection.** Every host streams its contiguous master range
//!    and, per destination host, accumulates assigned-node and
//!    assigned-edge counts, a dense per-node outgoing-edge counter vector
//!    and an incoming-edge bitset over the global id space. The counter
//!    starts at 1 for an assigned node, the sentinel that lets a receiver
//!    distinguish "owned, zero out-edges" (1) from "not owned here" (0).
//!    Hosts then walk all received counter vectors in global order to
//!    assign dense local ids (masters first, then ghosts: nodes with a
//!    local incoming edge owned elsewhere), and exchange sorted master
//!    lists so each ghost can binary-search its owner.
//! 2. **Edge distribution.** Sources owned locally write their out-edges
//!    straight into pre-allocated CSR slots; all other sources are
//!    buffered per owner host and flushed when a buffer exceeds the
//!    configured threshold. Receivers drain tagged records until the
//!    expected edge total (from phase 1) reaches zero.
//!
//! Count conservation, cursor/edge_end agreement and bitset length
//! agreement are `assert!`s: a violation means a protocol bug or corrupt
//! input, never a recoverable condition.

use std::ops::Range;
use std::path::Path;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use hashbrown::HashMap;
use log::debug;
use rayon::prelude::*;

use super::{compute_masters, PartitionConfig, VertexHostMap};
use crate::comm::wire::{WireBuf, WireReader};
use crate::comm::{PhaseCounter, Transport};
use crate::error::SubstrateError;
use crate::graph::{CsrGraph, EdgeData, GraphSlice, OfflineGraph};
use crate::util::DynamicBitset;

/// One host's partition of the global graph.
#[derive(Debug)]
pub struct CustomEdgeCut<E: EdgeData> {
    id: usize,
    num_hosts: usize,
    num_global_nodes: u64,
    num_global_edges: u64,
    gid2host: Vec<Range<u64>>,
    num_owned: u32,
    num_nodes: u32,
    num_edges: u64,
    local_to_global: Vec<u64>,
    global_to_local: HashMap<u64, u32>,
    mirror_owner: Vec<u32>,
    mirror_nodes: Vec<Vec<u64>>,
    graph: CsrGraph<E>,
    transposed: bool,
    thread_ranges: Vec<Range<u32>>,
    thread_ranges_masters: Vec<Range<u32>>,
}

/// What phase-1 inspection learned, carried into id assignment and the
/// edge distribution.
struct InspectionOutcome {
    /// Received (or locally synthesised, for `self`) counter vectors, in
    /// host order; entry `j` of host `i`'s vector covers gid
    /// `gid2host[i].start + j`.
    counters: Vec<Vec<u64>>,
    /// Authoritative incoming-edge set for this host after the OR-merge.
    incoming: DynamicBitset,
    /// Masters this host ends up owning.
    num_owned: u32,
    /// Edges other hosts will send in phase 2.
    edges_to_receive: u64,
}

impl<E: EdgeData> CustomEdgeCut<E> {
    /// Build this host's partition.
    ///
    /// `graph_file` is the shared input graph; `vertex_map_file` assigns an
    /// owning host to every global node id. `phase` is advanced once per
    /// all-to-all exchange performed.
    pub fn build<T: Transport>(
        graph_file: impl AsRef<Path>,
        vertex_map_file: impl AsRef<Path>,
        transport: &T,
        phase: &mut PhaseCounter,
        config: &PartitionConfig,
    ) -> Result<Self, SubstrateError> {
        let id = transport.rank();
        let num_hosts = transport.size();
        if vertex_map_file.as_ref().as_os_str().is_empty() {
            return Err(SubstrateError::MissingVertexMap);
        }

        let offline = OfflineGraph::open(graph_file)?;
        let num_global_nodes = offline.num_nodes();
        let num_global_edges = offline.num_edges();
        debug!(
            "[{id}] total nodes: {num_global_nodes}, total edges: {num_global_edges}"
        );

        let gid2host = compute_masters(&offline, num_hosts, config.masters);
        let my_range = gid2host[id].clone();
        let vmap = VertexHostMap::load(&vertex_map_file, my_range.clone(), num_hosts)?;
        if num_global_nodes == 0 {
            return Err(SubstrateError::EmptyVertexMap {
                path: vertex_map_file.as_ref().to_path_buf(),
            });
        }

        let slice = offline.load_slice::<E>(my_range.clone())?;
        let num_edges_distribute = slice.num_edges();
        debug!("[{id}] edges to distribute: {num_edges_distribute}");

        let outcome = inspect_and_exchange(
            id,
            num_hosts,
            num_global_nodes,
            &gid2host,
            &my_range,
            &vmap,
            &slice,
            transport,
            phase,
        )?;

        let mut part = Self {
            id,
            num_hosts,
            num_global_nodes,
            num_global_edges,
            gid2host,
            num_owned: outcome.num_owned,
            num_nodes: 0,
            num_edges: 0,
            local_to_global: Vec::new(),
            global_to_local: HashMap::new(),
            mirror_owner: Vec::new(),
            mirror_nodes: vec![Vec::new(); num_hosts],
            graph: CsrGraph::default(),
            transposed: false,
            thread_ranges: Vec::new(),
            thread_ranges_masters: Vec::new(),
        };

        let prefix = part.assign_local_ids(&outcome);
        part.resolve_mirror_owners(transport, phase)?;
        debug!(
            "[{}] resident nodes: {} ({} owned), resident edges: {}",
            id, part.num_nodes, part.num_owned, part.num_edges
        );

        part.graph.allocate_from(part.num_nodes, part.num_edges);
        part.graph.construct_nodes();
        part.graph.par_fix_end_edges(&prefix);

        part.load_edges(
            &vmap,
            &slice,
            transport,
            phase,
            config,
            outcome.edges_to_receive,
        )?;
        part.graph.seal();

        transport.barrier();

        if config.transpose && part.num_nodes > 0 {
            part.graph.transpose();
            part.transposed = true;
        }
        part.determine_thread_ranges();
        Ok(part)
    }

    /// Walk every counter vector in global order: a non-zero counter means
    /// this host owns the node (counter-1 out-edges); then a second pass
    /// materialises ghosts, so masters hold the contiguous low local ids.
    fn assign_local_ids(&mut self, outcome: &InspectionOutcome) -> Vec<u64> {
        let mut prefix = Vec::with_capacity(self.num_owned as usize);
        self.local_to_global.reserve(self.num_owned as usize);
        self.global_to_local.reserve(self.num_owned as usize);

        let mut src = 0u64;
        for (host, counters) in outcome.counters.iter().enumerate() {
            debug_assert_eq!(src, self.gid2host[host].start);
            for &c in counters {
                if c > 0 {
                    // subtract the ownership sentinel added before sending
                    self.num_edges += c - 1;
                    self.local_to_global.push(src);
                    self.global_to_local.insert(src, self.num_nodes);
                    self.num_nodes += 1;
                    prefix.push(self.num_edges);
                }
                src += 1;
            }
        }
        assert_eq!(self.num_nodes, self.num_owned, "owned-node count drifted");

        // Ghosts carry no outgoing edges, so the prefix sum stays flat.
        for gid in 0..self.num_global_nodes {
            if outcome.incoming.test(gid as usize)
                && !self.global_to_local.contains_key(&gid)
            {
                self.local_to_global.push(gid);
                self.global_to_local.insert(gid, self.num_nodes);
                self.num_nodes += 1;
                prefix.push(self.num_edges);
            }
        }
        prefix
    }

    /// All-to-all of sorted master lists; each ghost binary-searches every
    /// received list, and a hit pins its owner.
    fn resolve_mirror_owners<T: Transport>(
        &mut self,
        transport: &T,
        phase: &mut PhaseCounter,
    ) -> Result<(), SubstrateError> {
        let num_ghosts = (self.num_nodes - self.num_owned) as usize;
        self.mirror_owner = vec![u32::MAX; num_ghosts];

        let tag = phase.current();
        for x in 0..self.num_hosts {
            if x == self.id {
                continue;
            }
            let mut buf = WireBuf::new();
            buf.put_pod_slice(&self.local_to_global[..self.num_owned as usize]);
            transport.send_tagged(x, tag, buf);
        }
        transport.flush();

        let ghosts = &self.local_to_global[self.num_owned as usize..];
        for _ in 0..self.num_hosts - 1 {
            let (from, bytes) = recv_blocking(transport, tag);
            let masters: Vec<u64> = WireReader::new(&bytes).get_pod_vec()?;
            debug_assert!(masters.windows(2).all(|w| w[0] < w[1]));

            self.mirror_owner
                .par_iter_mut()
                .zip(ghosts.par_iter())
                .for_each(|(owner, gid)| {
                    if masters.binary_search(gid).is_ok() {
                        *owner = from as u32;
                    }
                });
        }
        phase.advance();

        for (k, &gid) in ghosts.iter().enumerate() {
            let owner = self.mirror_owner[k];
            assert!(owner != u32::MAX, "ghost {gid} has no owning host");
            self.mirror_nodes[owner as usize].push(gid);
        }
        Ok(())
    }

    /// Phase 2: construct locally owned edges in place, route the rest to
    /// their owners, then drain the expected incoming edge total.
    fn load_edges<T: Transport>(
        &self,
        vmap: &VertexHostMap,
        slice: &GraphSlice<E>,
        transport: &T,
        phase: &mut PhaseCounter,
        config: &PartitionConfig,
        edges_to_receive: u64,
    ) -> Result<(), SubstrateError> {
        if self.id == 0 {
            debug!(
                "[0] loading {} edge data while creating edges",
                if E::PRESENT { "weighted" } else { "void" }
            );
        }
        let tag = phase.current();
        let my_range = self.gid2host[self.id].clone();
        let threshold = config.edge_send_buffer_size;

        (my_range.start..my_range.end)
            .into_par_iter()
            .fold(
                || vec![WireBuf::new(); self.num_hosts],
                |mut bufs, src| {
                    let h = vmap.host_of_gid(src) as usize;
                    if h != self.id {
                        let dsts = slice.dsts_of(src);
                        if !dsts.is_empty() {
                            let buf = &mut bufs[h];
                            buf.put_u64(src);
                            buf.put_pod_slice(dsts);
                            if E::PRESENT {
                                buf.put_pod_slice(slice.data_of(src));
                            }
                            if buf.len() > threshold {
                                transport.send_tagged(h, tag, std::mem::take(buf));
                            }
                        }
                    } else {
                        debug_assert!(self.is_owned(src));
                        let lsrc = self.g2l(src);
                        let mut cur = self.graph.edge_begin(lsrc);
                        let data = slice.data_of(src);
                        for (k, &gdst) in slice.dsts_of(src).iter().enumerate() {
                            self.graph.construct_edge(cur, self.g2l(gdst), data[k]);
                            cur += 1;
                        }
                        debug_assert_eq!(cur, self.graph.edge_end(lsrc));
                    }
                    bufs
                },
            )
            .for_each(|bufs| {
                for (h, buf) in bufs.into_iter().enumerate() {
                    if h != self.id && !buf.is_empty() {
                        transport.send_tagged(h, tag, buf);
                    }
                }
            });
        transport.flush();

        self.receive_edges(transport, tag, edges_to_receive)?;
        phase.advance();
        Ok(())
    }

    /// Drain tagged edge records until the phase-1 total is accounted for.
    ///
    /// Runs on the calling thread: in-process clusters share the rayon
    /// pool, so a pool-wide spinning receive could starve a peer's send
    /// pass.
    fn receive_edges<T: Transport>(
        &self,
        transport: &T,
        tag: u32,
        edges_to_receive: u64,
    ) -> Result<(), SubstrateError> {
        let mut remaining = edges_to_receive;
        while remaining > 0 {
            let Some((_, bytes)) = transport.recv_tagged(tag) else {
                std::thread::yield_now();
                continue;
            };
            let mut r = WireReader::new(&bytes);
            while r.remaining() > 0 {
                let src = r.get_u64()?;
                let gdsts: Vec<u64> = r.get_pod_vec()?;
                let data: Vec<E> = if E::PRESENT {
                    r.get_pod_vec()?
                } else {
                    vec![E::zeroed(); gdsts.len()]
                };
                remaining -= gdsts.len() as u64;

                assert!(self.is_owned(src), "received edges for unowned source {src}");
                let lsrc = self.g2l(src);
                let mut cur = self.graph.edge_begin(lsrc);
                assert_eq!(
                    self.graph.edge_end(lsrc) - cur,
                    gdsts.len() as u64,
                    "edge record length disagrees with the phase-1 count for {src}"
                );
                for (k, &gdst) in gdsts.iter().enumerate() {
                    self.graph.construct_edge(cur, self.g2l(gdst), data[k]);
                    cur += 1;
                }
            }
        }
        Ok(())
    }

    fn determine_thread_ranges(&mut self) {
        let parts = rayon::current_num_threads();
        self.thread_ranges = edge_balanced_ranges(&self.graph, 0, self.num_nodes, parts);
        self.thread_ranges_masters =
            edge_balanced_ranges(&self.graph, 0, self.num_owned, parts);
    }

    /// True when `gid` has a local id on this host.
    #[inline]
    pub fn is_local(&self, gid: u64) -> bool {
        debug_assert!(gid < self.num_global_nodes);
        self.global_to_local.contains_key(&gid)
    }

    /// True when this host is `gid`'s master.
    #[inline]
    pub fn is_owned(&self, gid: u64) -> bool {
        matches!(self.global_to_local.get(&gid), Some(&lid) if lid < self.num_owned)
    }

    /// Local id of `gid`; `gid` must be local.
    #[inline]
    pub fn g2l(&self, gid: u64) -> u32 {
        self.global_to_local[&gid]
    }

    /// Global id of `lid`.
    #[inline]
    pub fn l2g(&self, lid: u32) -> u64 {
        self.local_to_global[lid as usize]
    }

    /// Owning host of a local `gid`: self for masters, the recorded mirror
    /// owner for ghosts.
    pub fn host_of(&self, gid: u64) -> u32 {
        let lid = self.g2l(gid);
        if lid < self.num_owned {
            self.id as u32
        } else {
            self.mirror_owner[(lid - self.num_owned) as usize]
        }
    }

    /// This host's rank.
    #[inline]
    pub fn host_id(&self) -> usize {
        self.id
    }

    /// Number of hosts in the run.
    #[inline]
    pub fn num_hosts(&self) -> usize {
        self.num_hosts
    }

    /// Masters resident here.
    #[inline]
    pub fn num_owned(&self) -> u32 {
        self.num_owned
    }

    /// Ghosts resident here.
    #[inline]
    pub fn num_ghosts(&self) -> u32 {
        self.num_nodes - self.num_owned
    }

    /// Masters plus ghosts.
    #[inline]
    pub fn num_nodes(&self) -> u32 {
        self.num_nodes
    }

    /// Local edge count.
    #[inline]
    pub fn num_edges(&self) -> u64 {
        self.num_edges
    }

    /// Global node count.
    #[inline]
    pub fn num_global_nodes(&self) -> u64 {
        self.num_global_nodes
    }

    /// Global edge count.
    #[inline]
    pub fn num_global_edges(&self) -> u64 {
        self.num_global_edges
    }

    /// Sorted global ids of the masters resident here.
    #[inline]
    pub fn masters(&self) -> &[u64] {
        &self.local_to_global[..self.num_owned as usize]
    }

    /// Global ids this host mirrors from `host`.
    #[inline]
    pub fn mirror_nodes(&self, host: usize) -> &[u64] {
        &self.mirror_nodes[host]
    }

    /// The local CSR.
    #[inline]
    pub fn graph(&self) -> &CsrGraph<E> {
        &self.graph
    }

    /// Whether the CSR was transposed during finalisation.
    #[inline]
    pub fn transposed(&self) -> bool {
        self.transposed
    }

    /// Master range of `host` in the global id space.
    #[inline]
    pub fn master_range(&self, host: usize) -> Range<u64> {
        self.gid2host[host].clone()
    }

    /// Edge-balanced per-thread node ranges over all local nodes.
    #[inline]
    pub fn thread_ranges(&self) -> &[Range<u32>] {
        &self.thread_ranges
    }

    /// Edge-balanced per-thread node ranges over the masters.
    #[inline]
    pub fn thread_ranges_masters(&self) -> &[Range<u32>] {
        &self.thread_ranges_masters
    }
}

/// Phase 1: parallel inspection of the local master range, the four-field
/// all-to-all, and the incoming-bitset OR-merge.
#[allow(clippy::too_many_arguments)]
fn inspect_and_exchange<E: EdgeData, T: Transport>(
    id: usize,
    num_hosts: usize,
    num_global_nodes: u64,
    gid2host: &[Range<u64>],
    my_range: &Range<u64>,
    vmap: &VertexHostMap,
    slice: &GraphSlice<E>,
    transport: &T,
    phase: &mut PhaseCounter,
) -> Result<InspectionOutcome, SubstrateError> {
    let mut nodes_per_host = Vec::with_capacity(num_hosts);
    nodes_per_host.resize_with(num_hosts, || AtomicU32::new(0));
    let mut edges_per_host = Vec::with_capacity(num_hosts);
    edges_per_host.resize_with(num_hosts, || AtomicU64::new(0));
    let incoming: Vec<DynamicBitset> = (0..num_hosts)
        .map(|_| DynamicBitset::new(num_global_nodes as usize))
        .collect();

    (my_range.start..my_range.end)
        .into_par_iter()
        .for_each(|src| {
            let h = vmap.host_of_gid(src) as usize;
            nodes_per_host[h].fetch_add(1, Ordering::Relaxed);
            edges_per_host[h].fetch_add(slice.degree(src), Ordering::Relaxed);
            for &gdst in slice.dsts_of(src) {
                incoming[h].set(gdst as usize);
            }
        });

    let check_num_edges: u64 = edges_per_host
        .iter()
        .map(|e| e.load(Ordering::Relaxed))
        .sum();
    assert_eq!(
        check_num_edges,
        slice.num_edges(),
        "inspection lost edges"
    );

    // Dense counter vector over this host's range, as destined for `x`:
    // degree+1 for nodes x owns (the sentinel), 0 elsewhere.
    let counters_for = |x: usize| -> Vec<u64> {
        (my_range.start..my_range.end)
            .map(|gid| {
                if vmap.host_of_gid(gid) as usize == x {
                    slice.degree(gid) + 1
                } else {
                    0
                }
            })
            .collect()
    };

    let tag = phase.current();
    for x in 0..num_hosts {
        if x == id {
            continue;
        }
        let mut buf = WireBuf::new();
        buf.put_u32(nodes_per_host[x].load(Ordering::Relaxed));
        buf.put_u64(edges_per_host[x].load(Ordering::Relaxed));
        buf.put_pod_slice(&counters_for(x));
        buf.put_bitset(&incoming[x]);
        transport.send_tagged(x, tag, buf);
    }
    transport.flush();
    debug!("[{id}] phase-1 data sent");

    let mut counters: Vec<Vec<u64>> = vec![Vec::new(); num_hosts];
    counters[id] = counters_for(id);
    let mut num_owned = nodes_per_host[id].load(Ordering::Relaxed);
    let mut edges_to_receive = 0u64;

    for _ in 0..num_hosts - 1 {
        let (from, bytes) = recv_blocking(transport, tag);
        let mut r = WireReader::new(&bytes);
        let nodes_from = r.get_u32()?;
        let edges_from = r.get_u64()?;
        counters[from] = r.get_pod_vec()?;
        let peer_incoming = r.get_bitset()?;
        assert_eq!(
            peer_incoming.len(),
            incoming[id].len(),
            "incoming bitset length disagrees with host {from}"
        );
        assert_eq!(
            counters[from].len() as u64,
            gid2host[from].end - gid2host[from].start,
            "counter vector from host {from} does not cover its range"
        );
        incoming[id].union_with(&peer_incoming);
        edges_to_receive += edges_from;
        num_owned += nodes_from;
    }
    debug!("[{id}] phase-1 data received");
    phase.advance();

    let incoming_mine = incoming.into_iter().nth(id).expect("own bitset");
    Ok(InspectionOutcome {
        counters,
        incoming: incoming_mine,
        num_owned,
        edges_to_receive,
    })
}

/// Poll the transport until a message for `tag` arrives.
fn recv_blocking<T: Transport>(transport: &T, tag: u32) -> (usize, Vec<u8>) {
    loop {
        if let Some(p) = transport.recv_tagged(tag) {
            return p;
        }
        std::thread::yield_now();
    }
}

/// Split `[lo, hi)` into `parts` node ranges with roughly equal edge mass.
fn edge_balanced_ranges<E: EdgeData>(
    graph: &CsrGraph<E>,
    lo: u32,
    hi: u32,
    parts: usize,
) -> Vec<Range<u32>> {
    if hi <= lo {
        return vec![lo..lo; parts];
    }
    let base = graph.edge_begin(lo);
    let total = graph.edge_end(hi - 1) - base;
    let mut bounds = Vec::with_capacity(parts + 1);
    bounds.push(lo);
    for t in 1..parts as u64 {
        let target = base + total * t / parts as u64;
        let (mut a, mut b) = (*bounds.last().expect("non-empty"), hi);
        while a < b {
            let mid = (a + b) / 2;
            if graph.edge_begin(mid) < target {
                a = mid + 1;
            } else {
                b = mid;
            }
        }
        bounds.push(a);
    }
    bounds.push(hi);
    (0..parts).map(|t| bounds[t]..bounds[t + 1]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::NoComm;
    use crate::graph::offline::write_graph;
    use crate::partition::vertex_map::write_vertex_map;

    fn single_host_triangle(transpose: bool) -> CustomEdgeCut<()> {
        let dir = tempfile::tempdir().unwrap();
        let graph = dir.path().join("tri.bin");
        let vmap = dir.path().join("tri.vmap");
        write_graph::<()>(
            &graph,
            &[vec![(1, ())], vec![(2, ())], vec![(0, ())]],
        )
        .unwrap();
        write_vertex_map(&vmap, &[0, 0, 0]).unwrap();
        let mut phase = PhaseCounter::new();
        CustomEdgeCut::build(
            &graph,
            &vmap,
            &NoComm,
            &mut phase,
            &PartitionConfig {
                transpose,
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn triangle_on_one_host() {
        let p = single_host_triangle(false);
        assert_eq!(p.num_owned(), 3);
        assert_eq!(p.num_ghosts(), 0);
        assert_eq!(p.num_edges(), 3);
        for gid in 0..3 {
            assert!(p.is_owned(gid));
            assert_eq!(p.l2g(p.g2l(gid)), gid);
            assert_eq!(p.host_of(gid), 0);
        }
        let lid = p.g2l(1);
        let dsts: Vec<u64> = p.graph().edges(lid).map(|(d, _)| p.l2g(d)).collect();
        assert_eq!(dsts, vec![2]);
    }

    #[test]
    fn triangle_transposed() {
        let p = single_host_triangle(true);
        assert!(p.transposed());
        assert_eq!(p.num_edges(), 3);
        // 0 -> 1 becomes 1 -> 0
        let lid = p.g2l(1);
        let dsts: Vec<u64> = p.graph().edges(lid).map(|(d, _)| p.l2g(d)).collect();
        assert_eq!(dsts, vec![0]);
    }

    #[test]
    fn isolated_owned_node_is_materialised() {
        // node 2 has no edges at all but is still owned: the +1 sentinel
        // must give it a local id and an empty edge range
        let dir = tempfile::tempdir().unwrap();
        let graph = dir.path().join("g.bin");
        let vmap = dir.path().join("g.vmap");
        write_graph::<()>(&graph, &[vec![(1, ())], vec![], vec![]]).unwrap();
        write_vertex_map(&vmap, &[0, 0, 0]).unwrap();
        let mut phase = PhaseCounter::new();
        let p: CustomEdgeCut<()> = CustomEdgeCut::build(
            &graph,
            &vmap,
            &NoComm,
            &mut phase,
            &PartitionConfig::default(),
        )
        .unwrap();
        assert_eq!(p.num_owned(), 3);
        let lid = p.g2l(2);
        assert_eq!(p.graph().degree(lid), 0);
        assert_eq!(p.graph().edge_begin(lid), p.graph().edge_end(lid));
    }

    #[test]
    fn missing_vertex_map_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let graph = dir.path().join("g.bin");
        write_graph::<()>(&graph, &[vec![(0, ())]]).unwrap();
        let mut phase = PhaseCounter::new();
        let err = CustomEdgeCut::<()>::build(
            &graph,
            "",
            &NoComm,
            &mut phase,
            &PartitionConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SubstrateError::MissingVertexMap));
    }

    #[test]
    fn thread_ranges_cover_all_nodes() {
        let p = single_host_triangle(false);
        let ranges = p.thread_ranges();
        assert_eq!(ranges.first().map(|r| r.start), Some(0));
        assert_eq!(ranges.last().map(|r| r.end), Some(p.num_nodes()));
        for w in ranges.windows(2) {
            assert_eq!(w[0].end, w[1].start);
        }
    }
}
