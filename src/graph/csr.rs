//! Local compressed-sparse-row graph builder.
//!
//! The partitioner drives this through a narrow protocol: `allocate_from`
//! sizes the arrays, `fix_end_edge` installs each row's end offset from the
//! edge prefix sum, and `construct_edge` fills pre-assigned edge slots,
//! possibly from several threads, each writing a disjoint slot range (one
//! range per source node). `seal` ends construction; reads and `transpose`
//! are only legal on a sealed graph.

use rayon::prelude::*;

use super::EdgeData;
use crate::util::LazyBuffer;

/// CSR graph over local node ids, built once and then read-only.
#[derive(Debug)]
pub struct CsrGraph<E: EdgeData> {
    num_nodes: u32,
    num_edges: u64,
    row_end: Vec<u64>,
    dsts: LazyBuffer<u32>,
    data: LazyBuffer<E>,
    sealed: bool,
}

impl<E: EdgeData> Default for CsrGraph<E> {
    fn default() -> Self {
        Self {
            num_nodes: 0,
            num_edges: 0,
            row_end: Vec::new(),
            dsts: LazyBuffer::new(0),
            data: LazyBuffer::new(0),
            sealed: false,
        }
    }
}

impl<E: EdgeData> CsrGraph<E> {
    /// Size the node and edge arrays. Discards any previous contents.
    pub fn allocate_from(&mut self, num_nodes: u32, num_edges: u64) {
        self.num_nodes = num_nodes;
        self.num_edges = num_edges;
        self.row_end = vec![0; num_nodes as usize];
        self.dsts = LazyBuffer::new(num_edges as usize);
        self.data = LazyBuffer::new(if E::PRESENT { num_edges as usize } else { 0 });
        self.sealed = false;
    }

    /// Initialise node storage. Row ends start at zero and are installed by
    /// [`fix_end_edge`](Self::fix_end_edge).
    pub fn construct_nodes(&mut self) {
        self.row_end.iter_mut().for_each(|e| *e = 0);
    }

    /// Install the edge-range end offset of `lid` from the prefix sum.
    #[inline]
    pub fn fix_end_edge(&mut self, lid: u32, end: u64) {
        self.row_end[lid as usize] = end;
    }

    /// Install every row end from `prefix` (`prefix[l]` is the end offset
    /// of row `l`) in parallel.
    pub fn par_fix_end_edges(&mut self, prefix: &[u64]) {
        assert_eq!(prefix.len(), self.num_nodes as usize);
        self.row_end
            .par_iter_mut()
            .zip(prefix.par_iter())
            .for_each(|(end, &p)| *end = p);
    }

    /// First edge slot of `lid`.
    #[inline]
    pub fn edge_begin(&self, lid: u32) -> u64 {
        if lid == 0 {
            0
        } else {
            self.row_end[lid as usize - 1]
        }
    }

    /// One past the last edge slot of `lid`.
    #[inline]
    pub fn edge_end(&self, lid: u32) -> u64 {
        self.row_end[lid as usize]
    }

    /// Write edge `slot` as `(dst_lid, data)`.
    ///
    /// Callers own disjoint slot ranges (one per source row) and write each
    /// slot exactly once; that contract is what makes the `&self` write
    /// sound.
    #[inline]
    pub fn construct_edge(&self, slot: u64, dst_lid: u32, data: E) {
        debug_assert!(!self.sealed, "construct_edge on a sealed graph");
        debug_assert!(slot < self.num_edges);
        unsafe {
            self.dsts.construct(slot as usize, dst_lid);
            if E::PRESENT {
                self.data.construct(slot as usize, data);
            }
        }
    }

    /// End construction. Every edge slot must have been written; the
    /// partitioner's cursor asserts enforce that per row.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Number of local nodes.
    #[inline]
    pub fn num_nodes(&self) -> u32 {
        self.num_nodes
    }

    /// Number of local edges.
    #[inline]
    pub fn num_edges(&self) -> u64 {
        self.num_edges
    }

    /// Out-degree of `lid`.
    #[inline]
    pub fn degree(&self, lid: u32) -> u64 {
        self.edge_end(lid) - self.edge_begin(lid)
    }

    fn dst_slice(&self) -> &[u32] {
        assert!(self.sealed, "edge reads require a sealed graph");
        unsafe { self.dsts.assume_init_slice() }
    }

    fn data_slice(&self) -> &[E] {
        assert!(self.sealed, "edge reads require a sealed graph");
        unsafe { self.data.assume_init_slice() }
    }

    /// Destination of edge slot `e`.
    #[inline]
    pub fn edge_dst(&self, e: u64) -> u32 {
        self.dst_slice()[e as usize]
    }

    /// Payload of edge slot `e` (`()` for void graphs).
    #[inline]
    pub fn edge_data(&self, e: u64) -> E {
        if E::PRESENT {
            self.data_slice()[e as usize]
        } else {
            E::zeroed()
        }
    }

    /// Iterate `(dst_lid, data)` over the out-edges of `lid`.
    pub fn edges(&self, lid: u32) -> impl Iterator<Item = (u32, E)> + '_ {
        let (b, e) = (self.edge_begin(lid), self.edge_end(lid));
        (b..e).map(move |s| (self.edge_dst(s), self.edge_data(s)))
    }

    /// Rebuild this graph with every edge reversed (counting sort on the
    /// destination). Ghost rows gain the former in-edges of their node.
    pub fn transpose(&mut self) {
        assert!(self.sealed, "transpose requires a sealed graph");
        let n = self.num_nodes as usize;
        let m = self.num_edges;

        let mut in_deg = vec![0u64; n];
        for e in 0..m {
            in_deg[self.edge_dst(e) as usize] += 1;
        }
        let mut new_row_end = vec![0u64; n];
        let mut running = 0u64;
        for l in 0..n {
            running += in_deg[l];
            new_row_end[l] = running;
        }

        let new_dsts = LazyBuffer::new(m as usize);
        let new_data = LazyBuffer::new(if E::PRESENT { m as usize } else { 0 });
        let mut cursor: Vec<u64> = (0..n as u32)
            .map(|l| if l == 0 { 0 } else { new_row_end[l as usize - 1] })
            .collect();
        for src in 0..self.num_nodes {
            for (dst, data) in self.edges(src) {
                let slot = cursor[dst as usize];
                cursor[dst as usize] += 1;
                unsafe {
                    new_dsts.construct(slot as usize, src);
                    if E::PRESENT {
                        new_data.construct(slot as usize, data);
                    }
                }
            }
        }
        debug_assert!(cursor
            .iter()
            .zip(&new_row_end)
            .all(|(c, e)| c == e));

        self.row_end = new_row_end;
        self.dsts = new_dsts;
        self.data = new_data;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_path() -> CsrGraph<()> {
        // 0 -> 1 -> 2, node 3 isolated
        let mut g = CsrGraph::<()>::default();
        g.allocate_from(4, 2);
        g.construct_nodes();
        for (lid, end) in [(0u32, 1u64), (1, 2), (2, 2), (3, 2)] {
            g.fix_end_edge(lid, end);
        }
        g.construct_edge(0, 1, ());
        g.construct_edge(1, 2, ());
        g.seal();
        g
    }

    #[test]
    fn ranges_follow_prefix_sum() {
        let g = build_path();
        assert_eq!((g.edge_begin(0), g.edge_end(0)), (0, 1));
        assert_eq!((g.edge_begin(1), g.edge_end(1)), (1, 2));
        assert_eq!(g.degree(2), 0);
        assert_eq!(g.degree(3), 0);
        assert_eq!(g.edges(1).map(|(d, _)| d).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn weighted_edges_keep_payloads() {
        let mut g = CsrGraph::<u32>::default();
        g.allocate_from(2, 2);
        g.construct_nodes();
        g.fix_end_edge(0, 2);
        g.fix_end_edge(1, 2);
        g.construct_edge(0, 1, 10);
        g.construct_edge(1, 0, 20);
        g.seal();
        assert_eq!(g.edges(0).collect::<Vec<_>>(), vec![(1, 10), (0, 20)]);
    }

    #[test]
    fn transpose_reverses_edges() {
        let mut g = build_path();
        g.transpose();
        assert_eq!(g.degree(0), 0);
        assert_eq!(g.edges(1).map(|(d, _)| d).collect::<Vec<_>>(), vec![0]);
        assert_eq!(g.edges(2).map(|(d, _)| d).collect::<Vec<_>>(), vec![1]);
        assert_eq!(g.num_edges(), 2);
    }

    #[test]
    fn transpose_preserves_weights() {
        let mut g = CsrGraph::<u32>::default();
        g.allocate_from(3, 2);
        g.construct_nodes();
        g.fix_end_edge(0, 2);
        g.fix_end_edge(1, 2);
        g.fix_end_edge(2, 2);
        g.construct_edge(0, 1, 5);
        g.construct_edge(1, 2, 6);
        g.seal();
        g.transpose();
        assert_eq!(g.edges(1).collect::<Vec<_>>(), vec![(0, 5)]);
        assert_eq!(g.edges(2).collect::<Vec<_>>(), vec![(0, 6)]);
    }
}
