//! Stagnation detection deciding when a cluster interlude replaces an annealing stage

use crate::io::configuration::{DEFAULT_STAGNATION_PATIENCE, DEFAULT_STAGNATION_THRESHOLD};

/// What the next temperature stage does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Metropolis moves over the whole grid
    Annealing,
    /// One pass of cluster-local optimization
    ClusterInterlude,
}

/// Counts stagnant stages and switches phases
///
/// An interlude lasts exactly one stage and is never directly followed by
/// another one.
#[derive(Debug, Clone, PartialEq)]
pub struct StagnationMonitor {
    threshold: f64,
    patience: usize,
    stagnant_stages: usize,
    previous_cost: Option<f64>,
    phase: Phase,
}

impl Default for StagnationMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_STAGNATION_THRESHOLD, DEFAULT_STAGNATION_PATIENCE)
    }
}

impl StagnationMonitor {
    /// Create a monitor; a patience of 0 behaves like 1
    pub fn new(threshold: f64, patience: usize) -> Self {
        Self {
            threshold,
            patience: patience.max(1),
            stagnant_stages: 0,
            previous_cost: None,
            phase: Phase::Annealing,
        }
    }

    /// Phase chosen for the most recent stage
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Consecutive stagnant stages seen so far
    pub const fn stagnant_stages(&self) -> usize {
        self.stagnant_stages
    }

    /// Cost the next stage is compared against
    pub const fn previous_cost(&self) -> Option<f64> {
        self.previous_cost
    }

    /// Decide the phase of the next stage given the current cost
    pub fn next_phase(&mut self, current_cost: f64) -> Phase {
        let after_interlude = self.phase == Phase::ClusterInterlude;
        self.phase = Phase::Annealing;

        let stagnant = self
            .previous_cost
            .is_some_and(|previous| relative_change(current_cost, previous) < self.threshold);

        if stagnant {
            self.stagnant_stages += 1;
            if self.stagnant_stages >= self.patience && !after_interlude {
                self.stagnant_stages = 0;
                self.phase = Phase::ClusterInterlude;
                return self.phase;
            }
        } else {
            self.stagnant_stages = 0;
        }

        self.previous_cost = Some(current_cost);
        self.phase
    }
}

/// `|current - previous| / |previous|`, infinite when only `previous` is zero
pub fn relative_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return if current == 0.0 { 0.0 } else { f64::INFINITY };
    }
    ((current - previous) / previous).abs()
}
