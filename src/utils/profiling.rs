use std::time::Duration;

/// Timings and counts recorded for the most recent step of a space.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StepProfile {
    pub broad_phase_time: Duration,
    pub narrow_phase_time: Duration,
    pub components_time: Duration,
    pub solver_time: Duration,
    pub integrator_time: Duration,
    pub total_time: Duration,

    pub active_body_count: usize,
    pub sleeping_component_count: usize,
    pub candidate_pair_count: usize,
    pub arbiter_count: usize,
    pub contact_count: usize,
}

impl StepProfile {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Logs a summary of the step at info level.
    pub fn report(&self) {
        let total_us = self.total_time.as_micros() as f64;
        if total_us < 1.0 {
            return;
        }
        let ms = |d: Duration| d.as_secs_f64() * 1000.0;
        let pct = |d: Duration| d.as_micros() as f64 / total_us * 100.0;

        log::info!(
            "Step: {:.3} ms, {} awake bodies, {} sleeping components, {} pairs, {} arbiters, {} contacts",
            ms(self.total_time),
            self.active_body_count,
            self.sleeping_component_count,
            self.candidate_pair_count,
            self.arbiter_count,
            self.contact_count
        );
        for (label, time) in [
            ("broad phase", self.broad_phase_time),
            ("narrow phase", self.narrow_phase_time),
            ("components", self.components_time),
            ("solver", self.solver_time),
            ("integrator", self.integrator_time),
        ] {
            log::info!("  {label:<12} {:.3} ms ({:.1}%)", ms(time), pct(time));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_everything() {
        let mut profile = StepProfile {
            total_time: Duration::from_millis(3),
            contact_count: 4,
            ..StepProfile::default()
        };
        profile.report();
        profile.reset();
        assert_eq!(profile, StepProfile::default());
    }
}
