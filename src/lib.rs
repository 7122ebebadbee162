//! Pixel art compression into horizontal runs, vertical runs and single pixels
//!
//! Every coloured pixel starts as its own pattern. Simulated annealing then
//! merges adjacent same-coloured patterns into longer runs, occasionally
//! breaking runs apart so better recombinations become reachable, and falls
//! back to cluster-local optimization when the cost stops improving.

#![forbid(unsafe_code)]

/// Cost function, cooling schedule, moves, clusters and the annealing driver
pub mod algorithm;
/// Colour palettes and grid statistics
pub mod analysis;
/// Input/output operations and error handling
pub mod io;
/// Acceptance probabilities and weighted random choice
pub mod math;
/// Patterns and the grid that owns them
pub mod spatial;

pub use io::error::{AlgorithmError, Result};
