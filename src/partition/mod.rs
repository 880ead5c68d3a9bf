//! Graph partitioning: master-range computation and the custom edge cut.

pub mod custom_cut;
pub mod vertex_map;

pub use custom_cut::CustomEdgeCut;
pub use vertex_map::{NodeInfo, VertexHostMap};

use std::ops::Range;

use crate::graph::OfflineGraph;

/// How contiguous master ranges are balanced across hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterPolicy {
    /// Equal node counts per host.
    BalancedNodes,
    /// Node boundaries chosen so hosts carry roughly equal edge counts.
    BalancedEdges,
}

/// Tunables for partition construction.
#[derive(Debug, Clone)]
pub struct PartitionConfig {
    /// Flush threshold, in bytes, for each per-host edge send buffer.
    pub edge_send_buffer_size: usize,
    /// Transpose the local CSR after construction (pull-style operators).
    pub transpose: bool,
    /// Master-range balancing policy.
    pub masters: MasterPolicy,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            edge_send_buffer_size: 8 << 20,
            transpose: false,
            masters: MasterPolicy::BalancedNodes,
        }
    }
}

/// Split `[0, num_nodes)` into one contiguous master range per host.
///
/// Ranges are returned in host order and tile the id space exactly; a range
/// may be empty when there are more hosts than nodes (or than edge mass).
pub fn compute_masters(
    graph: &OfflineGraph,
    num_hosts: usize,
    policy: MasterPolicy,
) -> Vec<Range<u64>> {
    let n = graph.num_nodes();
    match policy {
        MasterPolicy::BalancedNodes => (0..num_hosts as u64)
            .map(|h| {
                let lo = n * h / num_hosts as u64;
                let hi = n * (h + 1) / num_hosts as u64;
                lo..hi
            })
            .collect(),
        MasterPolicy::BalancedEdges => {
            let m = graph.num_edges();
            // cumulative edge count of the first k nodes
            let cum = |k: u64| if k == 0 { 0 } else { graph.edge_end(k - 1) };
            let mut bounds = Vec::with_capacity(num_hosts + 1);
            bounds.push(0u64);
            for h in 1..=num_hosts as u64 {
                if h == num_hosts as u64 {
                    bounds.push(n);
                    break;
                }
                let target = m * h / num_hosts as u64;
                // smallest node count whose cumulative edge total reaches target
                let (mut lo, mut hi) = (bounds[h as usize - 1], n);
                while lo < hi {
                    let mid = (lo + hi) / 2;
                    if cum(mid) < target {
                        lo = mid + 1;
                    } else {
                        hi = mid;
                    }
                }
                bounds.push(lo);
            }
            (0..num_hosts).map(|h| bounds[h]..bounds[h + 1]).collect()
        }
    }
}
