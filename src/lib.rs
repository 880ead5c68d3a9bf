//! # graph-substrate
//!
//! graph-substrate is a distributed, in-memory graph processing substrate.
//! It pairs a **custom-edge-cut partitioner**, which ingests a single
//! logical graph plus an externally supplied vertex→host assignment and
//! builds each host's CSR subgraph, local↔global id maps and mirror
//! lists through a two-phase all-to-all exchange, with a **speculative
//! parallel for-each executor** that drives cautious operators over a
//! shared worklist with conflict rollback, cooperative break, and
//! token-ring termination detection.
//!
//! ## Usage
//! Add `graph-substrate` as a dependency in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! graph-substrate = "0.2"
//! ```
//!
//! Partition a graph across the hosts of a [`comm::Transport`]:
//!
//! ```no_run
//! use graph_substrate::comm::{NoComm, PhaseCounter};
//! use graph_substrate::partition::{CustomEdgeCut, PartitionConfig};
//!
//! let mut phase = PhaseCounter::new();
//! let part: CustomEdgeCut<()> = CustomEdgeCut::build(
//!     "graph.bin",
//!     "graph.vmap",
//!     &NoComm,
//!     &mut phase,
//!     &PartitionConfig::default(),
//! )?;
//! assert_eq!(part.num_owned() + part.num_ghosts(), part.num_nodes());
//! # Ok::<(), graph_substrate::error::SubstrateError>(())
//! ```
//!
//! Run a parallel loop:
//!
//! ```
//! use graph_substrate::exec::{for_each, ExecConfig, UserContext};
//!
//! let items: Vec<u32> = (0..64).collect();
//! let stats = for_each(
//!     &items,
//!     |v: u32, ctx: &mut UserContext<u32>| {
//!         if v == 0 {
//!             ctx.push(100);
//!         }
//!     },
//!     "example",
//!     &ExecConfig::default(),
//! );
//! assert_eq!(stats.iterations, 65);
//! ```

pub mod comm;
pub mod error;
pub mod exec;
pub mod graph;
pub mod partition;
pub mod util;

/// The most-used traits and types in one import.
pub mod prelude {
    pub use crate::comm::{MemoryTransport, NoComm, PhaseCounter, Transport};
    pub use crate::error::SubstrateError;
    pub use crate::exec::{
        for_each, Conflict, ExecConfig, ForEach, IterationLock, LoopStatistics, Operator,
        UserContext, Worklist,
    };
    pub use crate::graph::{CsrGraph, EdgeData, OfflineGraph};
    pub use crate::partition::{CustomEdgeCut, MasterPolicy, PartitionConfig};
}
