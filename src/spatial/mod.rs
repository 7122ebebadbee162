//! Spatial data structures for the pattern canvas
//!
//! This module contains spatial-related functionality including:
//! - Pattern values and their merge/split algebra
//! - Grid ownership of patterns with pixel and colour indices

/// Grid state management and pattern ownership
pub mod grid;
/// Pattern geometry, adjacency, merging and splitting
pub mod pattern;

pub use grid::{Grid, ValidationResult};
pub use pattern::{ColorIndex, Direction, Pattern, PatternSize, PatternType, Position};
