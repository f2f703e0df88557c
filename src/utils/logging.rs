//! Trace logging for the phases of a step.

use log::{log_enabled, Level};
use std::time::{Duration, Instant};

/// A stage of `Space::step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Step,
    Integrate,
    BroadPhase,
    NarrowPhase,
    Components,
    Solve,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Step => "step",
            Phase::Integrate => "integrate",
            Phase::BroadPhase => "broad phase",
            Phase::NarrowPhase => "narrow phase",
            Phase::Components => "components",
            Phase::Solve => "solve",
        }
    }
}

/// Measures one phase of the step with the given stamp. Entry and exit are
/// traced; dropping the timer without calling [`PhaseTimer::finish`] still logs
/// the exit.
pub struct PhaseTimer {
    phase: Phase,
    stamp: u64,
    start: Instant,
    finished: bool,
}

impl PhaseTimer {
    pub fn start(phase: Phase, stamp: u64) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("[{stamp}] {} started", phase.label());
        }
        Self {
            phase,
            stamp,
            start: Instant::now(),
            finished: false,
        }
    }

    /// Stops the timer and returns the time spent in the phase.
    pub fn finish(mut self) -> Duration {
        self.finished = true;
        let elapsed = self.start.elapsed();
        self.trace_exit(elapsed);
        elapsed
    }

    fn trace_exit(&self, elapsed: Duration) {
        if log_enabled!(Level::Trace) {
            log::trace!(
                "[{}] {} finished in {} µs",
                self.stamp,
                self.phase.label(),
                elapsed.as_micros()
            );
        }
    }
}

impl Drop for PhaseTimer {
    fn drop(&mut self) {
        if !self.finished {
            self.trace_exit(self.start.elapsed());
        }
    }
}
