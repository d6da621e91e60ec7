//! The xTDH allocation engine.
//!
//! Produces, deterministically and idempotently, the full set of identity
//! balances as of a single global cutoff (the most recent UTC day
//! boundary). The computation is stateless-functional: given identical
//! grant, ownership-history, and consolidation inputs, two runs produce
//! identical output.
//!
//! The engine works over an in-memory [`Snapshot`] and knows nothing about
//! storage; the recalculation orchestrator loads the snapshot, runs
//! [`Allocator::compute`], and persists the result transactionally.

pub mod allocation;
pub mod error;
pub mod rates;
pub mod snapshot;
pub mod timeline;

pub use allocation::{full_days, AllocationResult, Allocator};
pub use error::EngineError;
pub use rates::RateSnapshot;
pub use snapshot::Snapshot;
pub use timeline::{build_timelines, CountedWindow, TokenTimeline};
