//! Deterministic test doubles for the xTDH engine.
//!
//! These are real implementations with controllable behavior, not mocks:
//! the [`MemoryStore`] honors every storage trait contract over plain
//! B-trees, and the [`NullClock`] only advances when told to.

pub mod clock;
pub mod store;

pub use clock::NullClock;
pub use store::MemoryStore;
