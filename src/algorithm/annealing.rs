//! Simulated annealing driver with cluster interludes on stagnation
//!
//! The optimizer is a state machine polled one temperature stage at a time:
//! `Init → ParameterEstimation → {Annealing | ClusterInterlude}* → Done`.
//! Callers that need budgets or progress reporting drive `execute_stage`
//! themselves; `run` simply polls until the schedule is exhausted.

use std::time::{Duration, Instant};

use rand::{SeedableRng, rngs::StdRng};
use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::algorithm::cluster::{ClusterOptimizer, ClusterStage, ClusterStageResult};
use crate::algorithm::cost::{CostFunction, CostWeights};
use crate::algorithm::moves::MoveGenerator;
use crate::algorithm::stagnation::{Phase, StagnationMonitor};
use crate::algorithm::temperature::{TemperatureParameters, TemperatureSchedule};
use crate::io::configuration::{
    CLUSTER_MOVE_ATTEMPTS, DEFAULT_SAMPLE_MOVES, DEFAULT_SEED, DEFAULT_STAGNATION_PATIENCE,
    DEFAULT_STAGNATION_THRESHOLD, SAMPLE_DELTA_FALLBACK_RATIO,
};
use crate::io::error::{Result, invalid_parameter};
use crate::io::visualization::SnapshotCapture;
use crate::math::probability::accept_with_probability;
use crate::spatial::grid::Grid;

/// Tunable parameters of one optimization run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OptimizerConfig {
    /// Cost term weights
    pub cost_weights: CostWeights,
    /// Cooling schedule parameters
    pub temperature: TemperatureParameters,
    /// Moves sampled to calibrate the temperatures
    pub sample_moves: usize,
    /// Relative cost change below which a stage is stagnant
    pub stagnation_threshold: f64,
    /// Stagnant stages before a cluster interlude
    pub stagnation_patience: usize,
    /// Proposals per cluster iteration before giving up
    pub cluster_move_attempts: usize,
    /// Seed of the run's random source
    pub seed: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            cost_weights: CostWeights::default(),
            temperature: TemperatureParameters::default(),
            sample_moves: DEFAULT_SAMPLE_MOVES,
            stagnation_threshold: DEFAULT_STAGNATION_THRESHOLD,
            stagnation_patience: DEFAULT_STAGNATION_PATIENCE,
            cluster_move_attempts: CLUSTER_MOVE_ATTEMPTS,
            seed: DEFAULT_SEED,
        }
    }
}

impl OptimizerConfig {
    /// Check every parameter before a run starts
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A cost weight is negative or not finite
    /// - The temperature parameters are invalid
    /// - The stagnation threshold is negative or patience is zero
    pub fn validate(&self) -> Result<()> {
        for (name, weight) in [
            ("pattern_weight", self.cost_weights.pattern_weight),
            ("single_penalty", self.cost_weights.single_penalty),
            ("transition_weight", self.cost_weights.transition_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(invalid_parameter(
                    name,
                    &weight,
                    &"cost weights must be finite and non-negative",
                ));
            }
        }
        self.temperature.validate()?;
        if self.stagnation_threshold.is_nan() || self.stagnation_threshold < 0.0 {
            return Err(invalid_parameter(
                "stagnation_threshold",
                &self.stagnation_threshold,
                &"must be non-negative",
            ));
        }
        if self.stagnation_patience == 0 {
            return Err(invalid_parameter(
                "stagnation_patience",
                &self.stagnation_patience,
                &"at least one stagnant stage is required",
            ));
        }
        Ok(())
    }
}

/// Lifecycle of a `PatternOptimizer`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerState {
    /// Grid and cost snapshotted, nothing run yet
    Init,
    /// Temperatures calibrated, no stage run yet
    ParameterEstimation,
    /// Last stage ran ordinary annealing
    Annealing {
        /// 1-based stage number
        stage: usize,
    },
    /// Last stage ran a cluster interlude
    ClusterInterlude {
        /// 1-based stage number
        stage: usize,
    },
    /// Schedule exhausted
    Done,
}

/// Temperatures and iteration budget derived from sampled moves
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibratedParameters {
    /// Mean `|Δcost|` of the sampled moves
    pub average_delta: f64,
    /// Smallest `|Δcost|` of the sampled moves
    pub minimum_delta: f64,
    /// First temperature of the schedule
    pub start_temperature: f64,
    /// Temperature the schedule stops at
    pub end_temperature: f64,
    /// Iterations run at every annealing stage
    pub iterations_per_temperature: usize,
    /// Number of stages in the schedule
    pub stage_count: usize,
}

/// What one stage did
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    /// 1-based stage number
    pub stage: usize,
    /// Total stages in the schedule
    pub total_stages: usize,
    /// Temperature of the stage
    pub temperature: f64,
    /// Kind of stage that ran
    pub phase: Phase,
    /// Grid cost after the stage
    pub current_cost: f64,
    /// Lowest cost seen so far
    pub best_cost: f64,
    /// Live patterns after the stage
    pub pattern_count: usize,
    /// Moves accepted during the stage
    pub accepted_moves: usize,
    /// Moves rejected during the stage
    pub rejected_moves: usize,
    /// Interlude outcome when the stage was a cluster interlude
    pub cluster_result: Option<ClusterStageResult>,
}

impl StageReport {
    /// Fraction of evaluated moves that were accepted
    pub fn acceptance_rate(&self) -> f64 {
        let evaluated = self.accepted_moves + self.rejected_moves;
        if evaluated == 0 {
            0.0
        } else {
            self.accepted_moves as f64 / evaluated as f64
        }
    }
}

/// Totals of a finished run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnnealingStats {
    /// Cost of the starting grid
    pub initial_cost: f64,
    /// Cost of the grid after the last stage
    pub final_cost: f64,
    /// Cost of the returned grid
    pub best_cost: f64,
    /// Propose/evaluate steps attempted
    pub total_iterations: usize,
    /// Moves accepted
    pub accepted_moves: usize,
    /// Moves rejected and undone
    pub rejected_moves: usize,
    /// Wall time of the run
    #[serde(rename = "execution_time_secs", serialize_with = "serialize_secs")]
    pub execution_time: Duration,
    /// Temperature stages executed
    pub temperature_stages: usize,
    /// Stages spent in cluster interludes
    pub cluster_stages: usize,
}

fn serialize_secs<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Simulated annealing optimizer over one grid
pub struct PatternOptimizer {
    config: OptimizerConfig,
    cost_function: CostFunction,
    schedule: TemperatureSchedule,
    cluster_optimizer: ClusterOptimizer,
    monitor: StagnationMonitor,
    rng: StdRng,
    grid: Grid,
    best_grid: Grid,
    current_cost: f64,
    best_cost: f64,
    calibration: Option<CalibratedParameters>,
    temperatures: Vec<f64>,
    next_stage: usize,
    state: OptimizerState,
    stats: AnnealingStats,
    started: Instant,
    snapshots: Option<SnapshotCapture>,
}

impl PatternOptimizer {
    /// Snapshot the starting grid and its cost
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn new(grid: Grid, config: OptimizerConfig) -> Result<Self> {
        config.validate()?;

        let cost_function = CostFunction::new(config.cost_weights);
        let initial_cost = cost_function.calculate(&grid);

        Ok(Self {
            config,
            cost_function,
            schedule: TemperatureSchedule::new(config.temperature),
            cluster_optimizer: ClusterOptimizer::new(cost_function, config.cluster_move_attempts),
            monitor: StagnationMonitor::new(config.stagnation_threshold, config.stagnation_patience),
            rng: StdRng::seed_from_u64(config.seed),
            best_grid: grid.clone(),
            grid,
            current_cost: initial_cost,
            best_cost: initial_cost,
            calibration: None,
            temperatures: Vec::new(),
            next_stage: 0,
            state: OptimizerState::Init,
            stats: AnnealingStats {
                initial_cost,
                final_cost: initial_cost,
                best_cost: initial_cost,
                ..AnnealingStats::default()
            },
            started: Instant::now(),
            snapshots: None,
        })
    }

    /// Run a grid to completion with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn optimize(grid: Grid, config: OptimizerConfig) -> Result<(Grid, AnnealingStats)> {
        Ok(Self::new(grid, config)?.run())
    }

    /// Poll stages until the schedule is exhausted
    pub fn run(mut self) -> (Grid, AnnealingStats) {
        while self.execute_stage().is_some() {}
        self.finish()
    }

    /// Record one frame per stage for a later GIF export
    pub fn enable_snapshots(&mut self, mut capture: SnapshotCapture) {
        capture.capture(&self.grid);
        self.snapshots = Some(capture);
    }

    /// Recorded stage frames, if enabled
    pub const fn snapshots(&self) -> Option<&SnapshotCapture> {
        self.snapshots.as_ref()
    }

    /// Configuration of the run
    pub const fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Current lifecycle state
    pub const fn state(&self) -> OptimizerState {
        self.state
    }

    /// Grid as left by the last stage
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Lowest-cost grid seen so far
    pub const fn best_grid(&self) -> &Grid {
        &self.best_grid
    }

    /// Cost of the current grid
    pub const fn current_cost(&self) -> f64 {
        self.current_cost
    }

    /// Lowest cost seen so far
    pub const fn best_cost(&self) -> f64 {
        self.best_cost
    }

    /// Running totals
    pub const fn stats(&self) -> &AnnealingStats {
        &self.stats
    }

    /// Calibration result once parameter estimation has run
    pub const fn calibration(&self) -> Option<&CalibratedParameters> {
        self.calibration.as_ref()
    }

    /// Apply and immediately undo sampled moves, returning their cost changes
    ///
    /// Falls back to a fraction of the current cost when no move exists.
    pub fn sample_cost_deltas(&mut self, samples: usize) -> Vec<f64> {
        let generator = MoveGenerator::default();
        let mut deltas = Vec::with_capacity(samples);

        for _ in 0..samples {
            let Some(candidate) = generator.generate_move(&self.grid, &mut self.rng) else {
                continue;
            };
            if !candidate.apply(&mut self.grid).is_valid() {
                continue;
            }
            deltas.push(self.cost_function.calculate_delta(
                &self.grid,
                candidate.patterns_removed(),
                candidate.patterns_added(),
                candidate.affected_positions(),
            ));
            candidate.undo(&mut self.grid);
        }

        if deltas.is_empty() {
            deltas.push(self.current_cost * SAMPLE_DELTA_FALLBACK_RATIO);
        }
        deltas
    }

    /// Calibrate start/end temperatures and build the cooling schedule
    pub fn estimate_parameters(&mut self) -> CalibratedParameters {
        let deltas = self.sample_cost_deltas(self.config.sample_moves);
        let magnitudes: Vec<f64> = deltas.iter().map(|delta| delta.abs()).collect();
        let average_delta = magnitudes.iter().sum::<f64>() / magnitudes.len().max(1) as f64;
        let minimum_delta = magnitudes.iter().copied().fold(f64::INFINITY, f64::min);
        let minimum_delta = if minimum_delta.is_finite() {
            minimum_delta
        } else {
            0.0
        };

        let start_temperature = self
            .schedule
            .calculate_start_temp(self.current_cost, average_delta);
        let end_temperature = self
            .schedule
            .calculate_end_temp(start_temperature, minimum_delta);
        let iterations_per_temperature = self.schedule.calculate_iterations(self.grid.len());

        self.temperatures = self
            .schedule
            .generate_schedule(start_temperature, end_temperature)
            .collect();
        self.next_stage = 0;

        let calibration = CalibratedParameters {
            average_delta,
            minimum_delta,
            start_temperature,
            end_temperature,
            iterations_per_temperature,
            stage_count: self.temperatures.len(),
        };
        info!(
            "Calibrated schedule: T {start_temperature:.3} -> {end_temperature:.3}, {} stages x {iterations_per_temperature} iterations",
            calibration.stage_count
        );

        self.calibration = Some(calibration);
        self.state = OptimizerState::ParameterEstimation;
        calibration
    }

    /// Run the next temperature stage; `None` once the schedule is exhausted
    pub fn execute_stage(&mut self) -> Option<StageReport> {
        if self.state == OptimizerState::Init {
            self.estimate_parameters();
        }
        if self.state == OptimizerState::Done {
            return None;
        }

        let Some(&temperature) = self.temperatures.get(self.next_stage) else {
            self.state = OptimizerState::Done;
            info!(
                "Schedule exhausted after {} stages, best cost {:.1}",
                self.stats.temperature_stages, self.best_cost
            );
            return None;
        };
        self.next_stage += 1;
        let stage = self.next_stage;
        self.stats.temperature_stages += 1;

        let phase = self.monitor.next_phase(self.current_cost);
        let (accepted_moves, rejected_moves, cluster_result) = match phase {
            Phase::Annealing => {
                self.state = OptimizerState::Annealing { stage };
                let (accepted, rejected) = self.anneal_stage(temperature);
                (accepted, rejected, None)
            }
            Phase::ClusterInterlude => {
                self.state = OptimizerState::ClusterInterlude { stage };
                (0, 0, Some(self.cluster_interlude(temperature)))
            }
        };

        if let Some(capture) = self.snapshots.as_mut() {
            capture.capture(&self.grid);
        }

        let report = StageReport {
            stage,
            total_stages: self.temperatures.len(),
            temperature,
            phase,
            current_cost: self.current_cost,
            best_cost: self.best_cost,
            pattern_count: self.grid.len(),
            accepted_moves,
            rejected_moves,
            cluster_result,
        };
        debug!(
            "Stage {stage}/{} at T={temperature:.4}: cost {:.1} (best {:.1}), {} patterns, acceptance {:.2}",
            report.total_stages,
            report.current_cost,
            report.best_cost,
            report.pattern_count,
            report.acceptance_rate()
        );

        Some(report)
    }

    // Position of `temperature` on the cooling curve, 1 at start and 0 at end
    fn temperature_ratio(&self, temperature: f64) -> f64 {
        let Some(calibration) = self.calibration else {
            return 1.0;
        };
        let span = calibration.start_temperature - calibration.end_temperature;
        if span > 0.0 {
            ((temperature - calibration.end_temperature) / span).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    fn anneal_stage(&mut self, temperature: f64) -> (usize, usize) {
        let generator = MoveGenerator::new(self.temperature_ratio(temperature));
        let iterations = self
            .calibration
            .map_or(0, |calibration| calibration.iterations_per_temperature);
        let (mut accepted, mut rejected) = (0, 0);

        for _ in 0..iterations {
            self.stats.total_iterations += 1;

            let Some(candidate) = generator.generate_move(&self.grid, &mut self.rng) else {
                continue;
            };
            if !candidate.apply(&mut self.grid).is_valid() {
                continue;
            }

            let delta = self.cost_function.calculate_delta(
                &self.grid,
                candidate.patterns_removed(),
                candidate.patterns_added(),
                candidate.affected_positions(),
            );
            let probability = self.schedule.acceptance_probability(delta, temperature);

            if accept_with_probability(&mut self.rng, probability) {
                accepted += 1;
                self.current_cost += delta;
                self.record_if_best();
            } else {
                rejected += 1;
                candidate.undo(&mut self.grid);
            }
        }

        self.stats.accepted_moves += accepted;
        self.stats.rejected_moves += rejected;
        (accepted, rejected)
    }

    fn cluster_interlude(&mut self, temperature: f64) -> ClusterStageResult {
        let iterations = self
            .calibration
            .map_or(0, |calibration| calibration.iterations_per_temperature);
        let result = ClusterStage::new(&mut self.grid, &self.cluster_optimizer).run_cluster_stage(
            temperature,
            iterations,
            &mut self.rng,
        );

        self.current_cost = result.final_cost;
        self.record_if_best();
        self.stats.cluster_stages += 1;
        info!(
            "Cluster interlude at T={temperature:.4}: {}/{} clusters improved, cost {:.1} -> {:.1}",
            result.clusters_improved,
            result.clusters_processed,
            result.initial_cost,
            result.final_cost
        );
        result
    }

    fn record_if_best(&mut self) {
        if self.current_cost < self.best_cost {
            self.best_cost = self.current_cost;
            self.best_grid.clone_from(&self.grid);
        }
    }

    /// Finish the run and return the best grid with the run totals
    pub fn finish(mut self) -> (Grid, AnnealingStats) {
        self.stats.final_cost = self.current_cost;
        self.stats.best_cost = self.best_cost;
        self.stats.execution_time = self.started.elapsed();
        info!(
            "Optimization finished: cost {:.1} -> {:.1} in {:.2}s ({} accepted, {} rejected)",
            self.stats.initial_cost,
            self.stats.best_cost,
            self.stats.execution_time.as_secs_f64(),
            self.stats.accepted_moves,
            self.stats.rejected_moves
        );
        (self.best_grid, self.stats)
    }
}
