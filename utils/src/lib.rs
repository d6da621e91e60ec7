//! Shared utilities for the xTDH engine.

pub mod logging;
pub mod spans;
pub mod time;
pub mod timing;

pub use logging::{init_logging, LogFormat};
pub use time::format_duration;
pub use timing::PhaseTimer;
