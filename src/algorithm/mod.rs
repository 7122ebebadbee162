//! Optimization algorithms over the pattern grid
//!
//! This module contains the search machinery:
//! - Cost function with exact local deltas
//! - Temperature calibration and geometric cooling
//! - Merge and break-recombine move proposals
//! - Cluster decomposition and cluster-local annealing
//! - Stagnation detection and the stepwise annealing driver

/// Simulated annealing driver
pub mod annealing;
/// Same-colour clusters and cluster interludes
pub mod cluster;
/// Grid cost and cost deltas
pub mod cost;
/// Move descriptions and proposal sampling
pub mod moves;
/// Stagnation state machine
pub mod stagnation;
/// Temperature schedule
pub mod temperature;

pub use annealing::{AnnealingStats, OptimizerConfig, PatternOptimizer};
pub use cost::{CostFunction, CostWeights};
