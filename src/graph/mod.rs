//! Local graph storage and the on-disk graph reader.

pub mod csr;
pub mod offline;

pub use csr::CsrGraph;
pub use offline::{GraphSlice, OfflineGraph};

/// Per-edge payload type. The whole edge pipeline monomorphises on this:
/// the weighted instantiation carries a parallel payload vector on the wire
/// and in the file, the void instantiation (`()`) carries none.
pub trait EdgeData: bytemuck::Pod + Send + Sync + 'static {
    /// True when edges carry a payload.
    const PRESENT: bool;
}

/// Void edge data: topology only.
impl EdgeData for () {
    const PRESENT: bool = false;
}

/// 32-bit edge weights.
impl EdgeData for u32 {
    const PRESENT: bool = true;
}

/// 64-bit edge weights.
impl EdgeData for u64 {
    const PRESENT: bool = true;
}
