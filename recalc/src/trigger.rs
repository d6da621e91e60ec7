//! Best-effort trigger for the stats materializer.
//!
//! After a committed recompute the orchestrator asks a detached worker to
//! rebuild the stats slots. The request is fire-and-forget: a missing or
//! closed queue is logged as a warning and never fails the run — the
//! balances are already correct and durable either way.

use tokio::sync::mpsc;
use tracing::warn;

use xtdh_types::Timestamp;

/// A request to rebuild and promote the stats slots.
#[derive(Clone, Copy, Debug)]
pub struct StatsRebuildRequest {
    /// The cutoff of the committed run the rebuild should reflect.
    pub cutoff: Timestamp,
}

/// Handle for enqueueing [`StatsRebuildRequest`]s.
pub struct StatsTrigger {
    tx: Option<mpsc::Sender<StatsRebuildRequest>>,
}

impl StatsTrigger {
    /// A trigger wired to a worker's queue.
    pub fn new(tx: mpsc::Sender<StatsRebuildRequest>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A trigger with no queue configured. Every send is skipped with a
    /// warning.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Enqueue a rebuild request, best-effort.
    pub fn send(&self, request: StatsRebuildRequest) {
        match &self.tx {
            None => {
                warn!("stats trigger not configured, skipping rebuild request");
            }
            Some(tx) => {
                if let Err(e) = tx.try_send(request) {
                    warn!(error = %e, "failed to enqueue stats rebuild request");
                }
            }
        }
    }
}
