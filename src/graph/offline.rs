//! On-disk graph file: whole-index reader and streamed partial loads.
//!
//! Layout, all little-endian:
//!
//! ```text
//! u64 version (= 1)
//! u64 edge_data_size     (bytes per edge payload; 0 for void)
//! u64 num_nodes
//! u64 num_edges
//! u64 row_end[num_nodes] (cumulative out-edge count, exclusive end)
//! u64 dst[num_edges]
//! u8  payload[num_edges * edge_data_size]
//! ```
//!
//! `OfflineGraph` keeps only the header and row index resident and answers
//! degree queries; [`OfflineGraph::load_slice`] streams one contiguous node
//! range's destinations (and payloads) into memory, which is all the
//! partitioner ever touches of the file after startup.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::{Path, PathBuf};

use super::EdgeData;
use crate::error::SubstrateError;

/// Supported file format version.
pub const GRAPH_FORMAT_VERSION: u64 = 1;

const HEADER_BYTES: u64 = 32;

fn io_err(path: &Path, source: std::io::Error) -> SubstrateError {
    SubstrateError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_u64s(file: &mut File, path: &Path, n: usize) -> Result<Vec<u64>, SubstrateError> {
    let mut bytes = vec![0u8; n * 8];
    file.read_exact(&mut bytes).map_err(|e| io_err(path, e))?;
    Ok(bytemuck::pod_collect_to_vec(&bytes))
}

/// Random-access view of an on-disk graph.
#[derive(Debug)]
pub struct OfflineGraph {
    path: PathBuf,
    edge_data_size: u64,
    num_nodes: u64,
    num_edges: u64,
    row_end: Vec<u64>,
}

impl OfflineGraph {
    /// Open a graph file and load its row index.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SubstrateError> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| io_err(path, e))?;
        let header = read_u64s(&mut file, path, 4)?;
        let (version, edge_data_size, num_nodes, num_edges) =
            (header[0], header[1], header[2], header[3]);
        if version != GRAPH_FORMAT_VERSION {
            return Err(SubstrateError::BadGraphHeader {
                path: path.to_path_buf(),
                reason: format!("version {version}, expected {GRAPH_FORMAT_VERSION}"),
            });
        }
        let row_end = read_u64s(&mut file, path, num_nodes as usize)?;
        if row_end.last().copied().unwrap_or(0) != num_edges {
            return Err(SubstrateError::BadGraphHeader {
                path: path.to_path_buf(),
                reason: format!(
                    "row index ends at {}, header promises {num_edges} edges",
                    row_end.last().copied().unwrap_or(0)
                ),
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
            edge_data_size,
            num_nodes,
            num_edges,
            row_end,
        })
    }

    /// Number of nodes in the whole graph.
    #[inline]
    pub fn num_nodes(&self) -> u64 {
        self.num_nodes
    }

    /// Number of edges in the whole graph.
    #[inline]
    pub fn num_edges(&self) -> u64 {
        self.num_edges
    }

    /// First edge index of `gid`.
    #[inline]
    pub fn edge_begin(&self, gid: u64) -> u64 {
        if gid == 0 {
            0
        } else {
            self.row_end[gid as usize - 1]
        }
    }

    /// One past the last edge index of `gid`.
    #[inline]
    pub fn edge_end(&self, gid: u64) -> u64 {
        self.row_end[gid as usize]
    }

    /// Stream the edges of nodes `range` into memory.
    ///
    /// `E` must match the file's payload width (`()` for a void file).
    pub fn load_slice<E: EdgeData>(
        &self,
        range: Range<u64>,
    ) -> Result<GraphSlice<E>, SubstrateError> {
        let expected = std::mem::size_of::<E>() as u64;
        if self.edge_data_size != expected {
            return Err(SubstrateError::EdgeDataSizeMismatch {
                path: self.path.clone(),
                found: self.edge_data_size,
                expected,
            });
        }
        assert!(range.start <= range.end && range.end <= self.num_nodes);

        let e_lo = self.edge_begin(range.start);
        let e_hi = if range.is_empty() {
            e_lo
        } else {
            self.edge_end(range.end - 1)
        };
        let n_edges = (e_hi - e_lo) as usize;

        // rebased exclusive row ends for the slice
        let offsets: Vec<u64> = range
            .clone()
            .map(|gid| self.edge_end(gid) - e_lo)
            .collect();

        let mut file = File::open(&self.path).map_err(|e| io_err(&self.path, e))?;
        file.seek(SeekFrom::Start(HEADER_BYTES + 8 * self.num_nodes + 8 * e_lo))
            .map_err(|e| io_err(&self.path, e))?;
        let dsts = read_u64s(&mut file, &self.path, n_edges)?;

        let data = if E::PRESENT {
            file.seek(SeekFrom::Start(
                HEADER_BYTES + 8 * self.num_nodes + 8 * self.num_edges + expected * e_lo,
            ))
            .map_err(|e| io_err(&self.path, e))?;
            let mut bytes = vec![0u8; n_edges * expected as usize];
            file.read_exact(&mut bytes).map_err(|e| io_err(&self.path, e))?;
            bytemuck::pod_collect_to_vec(&bytes)
        } else {
            vec![E::zeroed(); n_edges]
        };

        Ok(GraphSlice {
            lo: range.start,
            offsets,
            dsts,
            data,
        })
    }
}

/// In-memory edges of one contiguous node range.
#[derive(Debug)]
pub struct GraphSlice<E: EdgeData> {
    lo: u64,
    offsets: Vec<u64>,
    dsts: Vec<u64>,
    data: Vec<E>,
}

impl<E: EdgeData> GraphSlice<E> {
    /// First global node id covered.
    #[inline]
    pub fn lo(&self) -> u64 {
        self.lo
    }

    /// Nodes covered by the slice.
    #[inline]
    pub fn num_local_nodes(&self) -> usize {
        self.offsets.len()
    }

    /// Total edges held.
    #[inline]
    pub fn num_edges(&self) -> u64 {
        self.offsets.last().copied().unwrap_or(0)
    }

    fn bounds(&self, gid: u64) -> (usize, usize) {
        let j = (gid - self.lo) as usize;
        let b = if j == 0 { 0 } else { self.offsets[j - 1] as usize };
        (b, self.offsets[j] as usize)
    }

    /// Out-degree of `gid`.
    #[inline]
    pub fn degree(&self, gid: u64) -> u64 {
        let (b, e) = self.bounds(gid);
        (e - b) as u64
    }

    /// Destination ids of `gid`'s out-edges.
    #[inline]
    pub fn dsts_of(&self, gid: u64) -> &[u64] {
        let (b, e) = self.bounds(gid);
        &self.dsts[b..e]
    }

    /// Payloads of `gid`'s out-edges (unit values for a void slice).
    #[inline]
    pub fn data_of(&self, gid: u64) -> &[E] {
        let (b, e) = self.bounds(gid);
        &self.data[b..e]
    }
}

/// Write a graph file from adjacency lists. Fixture and tooling helper;
/// `E = ()` writes a void file.
pub fn write_graph<E: EdgeData>(
    path: impl AsRef<Path>,
    adjacency: &[Vec<(u64, E)>],
) -> Result<(), SubstrateError> {
    use std::io::Write;

    let path = path.as_ref();
    let num_nodes = adjacency.len() as u64;
    let num_edges: u64 = adjacency.iter().map(|a| a.len() as u64).sum();
    let edge_data_size = std::mem::size_of::<E>() as u64;

    let mut out = Vec::with_capacity((HEADER_BYTES + 8 * num_nodes + 8 * num_edges) as usize);
    for v in [GRAPH_FORMAT_VERSION, edge_data_size, num_nodes, num_edges] {
        out.extend_from_slice(&v.to_le_bytes());
    }
    let mut running = 0u64;
    for adj in adjacency {
        running += adj.len() as u64;
        out.extend_from_slice(&running.to_le_bytes());
    }
    for adj in adjacency {
        for (dst, _) in adj {
            out.extend_from_slice(&dst.to_le_bytes());
        }
    }
    if E::PRESENT {
        for adj in adjacency {
            for (_, data) in adj {
                out.extend_from_slice(bytemuck::bytes_of(data));
            }
        }
    }
    let mut file = File::create(path).map_err(|e| io_err(path, e))?;
    file.write_all(&out).map_err(|e| io_err(path, e))?;
    Ok(())
}
