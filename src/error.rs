//! SubstrateError: unified error type for graph-substrate public APIs.
//!
//! Configuration and I/O failures surface through this enum; protocol
//! invariants (edge-count conservation, cursor/edge_end agreement, bitset
//! length agreement across hosts) are `assert!`s because they indicate
//! programmer or data-corruption bugs, not recoverable conditions.

use std::path::PathBuf;
use thiserror::Error;

use crate::comm::wire::WireError;

/// Unified error type for graph-substrate operations.
#[derive(Debug, Error)]
pub enum SubstrateError {
    /// A file could not be opened or read.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File the operation was addressing.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// No vertex→host map file was supplied for a custom cut.
    #[error("no vertex-host map provided for custom edge cut")]
    MissingVertexMap,
    /// The vertex→host map covered zero nodes.
    #[error("vertex-host map {path} is empty")]
    EmptyVertexMap {
        /// Map file path.
        path: PathBuf,
    },
    /// A vertex→host map entry named a host outside `[0, num_hosts)`.
    #[error("vertex-host map entry {offset} names host {host}, but there are {num_hosts} hosts")]
    InvalidHostEntry {
        /// Offset of the bad entry within the loaded slice.
        offset: usize,
        /// Host id found in the file.
        host: i32,
        /// Number of hosts in the run.
        num_hosts: usize,
    },
    /// An on-disk graph file had a malformed or unsupported header.
    #[error("bad graph header in {path}: {reason}")]
    BadGraphHeader {
        /// Graph file path.
        path: PathBuf,
        /// Human-readable mismatch description.
        reason: String,
    },
    /// The file's per-edge payload width does not match the requested edge type.
    #[error("graph {path} stores {found}-byte edge data, caller expects {expected}")]
    EdgeDataSizeMismatch {
        /// Graph file path.
        path: PathBuf,
        /// Width recorded in the header.
        found: u64,
        /// Width of the requested edge-data type.
        expected: u64,
    },
    /// A partition meta file ended before the promised number of records.
    #[error("meta file {path} truncated: expected {expected} records, read {read}")]
    TruncatedMetaFile {
        /// Meta file path.
        path: PathBuf,
        /// Record count from the file header.
        expected: u64,
        /// Records actually present.
        read: u64,
    },
    /// A tagged message failed to decode.
    #[error("wire decode failed: {0}")]
    Wire(#[from] WireError),
}
