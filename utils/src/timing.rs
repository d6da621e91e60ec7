//! Named phase timing for the recalculation pipeline.
//!
//! Every phase of a run is wrapped in [`PhaseTimer::time`]; at the end of
//! the run [`PhaseTimer::report`] emits one line per phase plus the total.

use std::time::{Duration, Instant};

/// Collects named phase durations over one run.
pub struct PhaseTimer {
    phases: Vec<(&'static str, Duration)>,
    started: Instant,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self {
            phases: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Run `f`, recording its wall-clock duration under `name`.
    pub fn time<T>(&mut self, name: &'static str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.phases.push((name, start.elapsed()));
        out
    }

    /// Total elapsed time since the timer was created.
    pub fn total(&self) -> Duration {
        self.started.elapsed()
    }

    /// Recorded phases, in execution order.
    pub fn phases(&self) -> &[(&'static str, Duration)] {
        &self.phases
    }

    /// Emit one log line per phase and one for the total.
    pub fn report(&self) {
        for (name, elapsed) in &self.phases {
            tracing::info!(
                phase = *name,
                elapsed_ms = elapsed.as_millis() as u64,
                "phase complete"
            );
        }
        tracing::info!(
            total_ms = self.total().as_millis() as u64,
            "run complete"
        );
    }
}

impl Default for PhaseTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_phases_in_order() {
        let mut timer = PhaseTimer::new();
        let x = timer.time("first", || 1 + 1);
        assert_eq!(x, 2);
        timer.time("second", || ());
        let names: Vec<_> = timer.phases().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn propagates_closure_result() {
        let mut timer = PhaseTimer::new();
        let r: Result<u32, &str> = timer.time("fallible", || Err("boom"));
        assert!(r.is_err());
        assert_eq!(timer.phases().len(), 1);
    }
}
