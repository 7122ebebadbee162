//! Mathematical utilities for the optimizer

/// Acceptance probabilities and weighted sampling
pub mod probability;
