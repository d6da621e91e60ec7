//! The stats materializer.
//!
//! Builds read-optimized per-grant and per-token daily-rate snapshots into
//! the currently inactive stats slot, then atomically promotes that slot.
//! Readers always resolve the active slot first and read from it only, so
//! a rebuild never disturbs them; a failed rebuild leaves the previous
//! slot serving.

pub mod error;
pub mod materializer;
pub mod metrics;

pub use error::StatsError;
pub use materializer::StatsMaterializer;
pub use metrics::EngineMetrics;
