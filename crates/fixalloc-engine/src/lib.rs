//! fixalloc-engine: Partition placement and reclaim engine
//!
//! This crate places waiting jobs into fixed-size partitions and reclaims them:
//! - First, Best, Worst and Next Fit placement strategies
//! - Allocation passes and deallocation over caller-owned collections
//! - A session that owns entities, id counters and the Next Fit cursor
//! - Snapshots and memory statistics for reporting

pub mod allocator;
pub mod placement;
pub mod session;
pub mod snapshot;

pub use allocator::{AllocationOutcome, Deallocation, Placement, PlacementResult};
pub use placement::{strategy_for, PlacementStrategy};
pub use session::Session;
pub use snapshot::{JobView, MemoryStats, PartitionView, SessionSnapshot};
