//! The recalculation orchestrator.
//!
//! Sequences a correct, all-or-nothing xTDH recompute: rate re-review,
//! identity minting for newly observed wallets, snapshot load, the
//! allocation engine, the atomic balance write, and — only after the
//! write has landed — a best-effort trigger for the stats materializer in
//! a separate execution context.

pub mod error;
pub mod recalculator;
pub mod review;
pub mod trigger;

pub use error::RecalcError;
pub use recalculator::{Recalculator, RunSummary};
pub use review::{NoopRateReviewer, RateReviewer, ReviewError};
pub use trigger::{StatsRebuildRequest, StatsTrigger};
