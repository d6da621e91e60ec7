//! LMDB storage backend for the xTDH engine.
//!
//! Implements all storage traits from `xtdh-store` using the `heed` LMDB
//! bindings. Each logical store maps to one LMDB database within a single
//! environment; the two stats slots are two parallel database pairs. The
//! balance write sequence runs inside one LMDB write transaction via
//! [`WriteBatch`].

pub mod balance;
pub mod collection;
pub mod consolidation;
pub mod environment;
pub mod error;
pub mod grant;
pub mod identity;
pub mod meta;
pub mod ownership;
pub mod stats;
pub mod write_batch;

pub use environment::{LmdbStore, SCHEMA_VERSION};
pub use error::LmdbError;
pub use write_batch::WriteBatch;
