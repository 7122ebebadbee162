//! Geometric cooling schedule calibrated from sampled cost changes

use serde::Serialize;

use crate::io::configuration::{
    DEFAULT_COOLING_RATE, DEFAULT_FINAL_ACCEPT_RATIO, DEFAULT_INITIAL_ACCEPT_RATIO,
    DEFAULT_ITERATIONS_MULTIPLIER, DEFAULT_MAX_ITERATIONS, DEFAULT_MIN_ITERATIONS,
    END_TEMPERATURE_FALLBACK_RATIO, START_TEMPERATURE_FALLBACK_RATIO,
};
use crate::io::error::{Result, invalid_parameter};
use crate::math::probability::{metropolis_acceptance, temperature_for_acceptance};

/// Parameters controlling the temperature schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureParameters {
    /// Target acceptance probability of a typical worsening move at the start
    pub initial_accept_ratio: f64,
    /// Target acceptance probability of the smallest worsening move at the end
    pub final_accept_ratio: f64,
    /// Cooling factor between stages, in `(0, 1)`
    pub alpha: f64,
    /// Minimum iterations per temperature
    pub min_iterations: usize,
    /// Maximum iterations per temperature
    pub max_iterations: usize,
    /// Iterations granted per unit of problem size
    pub iterations_multiplier: usize,
}

impl Default for TemperatureParameters {
    fn default() -> Self {
        Self {
            initial_accept_ratio: DEFAULT_INITIAL_ACCEPT_RATIO,
            final_accept_ratio: DEFAULT_FINAL_ACCEPT_RATIO,
            alpha: DEFAULT_COOLING_RATE,
            min_iterations: DEFAULT_MIN_ITERATIONS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            iterations_multiplier: DEFAULT_ITERATIONS_MULTIPLIER,
        }
    }
}

impl TemperatureParameters {
    /// Check that the parameters describe a finite, cooling schedule
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `alpha` is not strictly between 0 and 1
    /// - An acceptance ratio is not strictly between 0 and 1
    /// - `min_iterations` exceeds `max_iterations`
    pub fn validate(&self) -> Result<()> {
        if self.alpha.is_nan() || self.alpha <= 0.0 || self.alpha >= 1.0 {
            return Err(invalid_parameter(
                "alpha",
                &self.alpha,
                &"cooling rate must lie strictly between 0 and 1",
            ));
        }
        for (name, ratio) in [
            ("initial_accept_ratio", self.initial_accept_ratio),
            ("final_accept_ratio", self.final_accept_ratio),
        ] {
            if ratio.is_nan() || ratio <= 0.0 || ratio >= 1.0 {
                return Err(invalid_parameter(
                    name,
                    &ratio,
                    &"acceptance ratio must lie strictly between 0 and 1",
                ));
            }
        }
        if self.min_iterations > self.max_iterations {
            return Err(invalid_parameter(
                "min_iterations",
                &self.min_iterations,
                &format!("must not exceed max_iterations ({})", self.max_iterations),
            ));
        }
        Ok(())
    }
}

/// Cooling curve and Metropolis acceptance rule
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TemperatureSchedule {
    params: TemperatureParameters,
}

impl TemperatureSchedule {
    /// Create a schedule from parameters
    pub const fn new(params: TemperatureParameters) -> Self {
        Self { params }
    }

    /// Parameters in use
    pub const fn params(&self) -> &TemperatureParameters {
        &self.params
    }

    /// Temperature at which a move of size `avg_delta` is accepted with the initial ratio
    ///
    /// Falls back to a fixed fraction of `initial_cost` when no change was observed.
    pub fn calculate_start_temp(&self, initial_cost: f64, avg_delta: f64) -> f64 {
        temperature_for_acceptance(avg_delta, self.params.initial_accept_ratio)
            .unwrap_or(initial_cost.abs() * START_TEMPERATURE_FALLBACK_RATIO)
    }

    /// Temperature at which a move of size `min_delta` is accepted with the final ratio
    ///
    /// Falls back to a fixed fraction of `start_temp` when the smallest change is zero.
    pub fn calculate_end_temp(&self, start_temp: f64, min_delta: f64) -> f64 {
        temperature_for_acceptance(min_delta, self.params.final_accept_ratio)
            .unwrap_or(start_temp * END_TEMPERATURE_FALLBACK_RATIO)
    }

    /// Iterations per temperature, scaled with problem size and clamped
    pub fn calculate_iterations(&self, problem_size: usize) -> usize {
        problem_size
            .saturating_mul(self.params.iterations_multiplier)
            .min(self.params.max_iterations)
            .max(self.params.min_iterations)
    }

    /// Temperatures from `start` down to (excluding) the first value `<= end`
    pub const fn generate_schedule(&self, start: f64, end: f64) -> Schedule {
        Schedule::new(start, end, self.params.alpha)
    }

    /// Probability of accepting a cost change at `temperature`
    #[allow(clippy::unused_self)]
    pub fn acceptance_probability(&self, delta: f64, temperature: f64) -> f64 {
        metropolis_acceptance(delta, temperature)
    }
}

/// Strictly decreasing geometric sequence of temperatures
///
/// Cloning restarts nothing: each clone continues from where it was taken, and
/// a fresh `generate_schedule` call always starts over.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    current: f64,
    end: f64,
    alpha: f64,
}

impl Schedule {
    const fn new(start: f64, end: f64, alpha: f64) -> Self {
        // A floor above zero keeps the sequence finite for non-positive ends
        let end = if end > f64::MIN_POSITIVE {
            end
        } else {
            f64::MIN_POSITIVE
        };
        Self {
            current: start,
            end,
            alpha,
        }
    }
}

impl Iterator for Schedule {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let cooling = self.alpha > 0.0 && self.alpha < 1.0;
        if !cooling || !self.current.is_finite() || self.current <= self.end {
            return None;
        }
        let temperature = self.current;
        self.current *= self.alpha;
        Some(temperature)
    }
}
