//! Summary statistics of a pattern grid

use serde::Serialize;

use crate::spatial::grid::Grid;

/// Shape and size summary of a grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GridStatistics {
    /// Live patterns
    pub total_patterns: usize,
    /// Covered pixels
    pub total_pixels: usize,
    /// Single-pixel patterns
    pub single_pixels: usize,
    /// Horizontal runs
    pub horizontal_lines: usize,
    /// Vertical runs
    pub vertical_lines: usize,
    /// Distinct colours in use
    pub total_colors: usize,
    /// Longest run
    pub max_pattern_size: u32,
    /// Boundaries between different patterns
    pub transitions: usize,
    /// Mean pixels per pattern, 0 for an empty grid
    pub avg_pattern_size: f64,
}

impl GridStatistics {
    /// Compute every statistic from the grid
    pub fn calculate(grid: &Grid) -> Self {
        let counts = grid.pattern_counts();
        let total_pixels = grid.pixel_count();
        let avg_pattern_size = if counts.total() == 0 {
            0.0
        } else {
            total_pixels as f64 / counts.total() as f64
        };

        Self {
            total_patterns: counts.total(),
            total_pixels,
            single_pixels: counts.single,
            horizontal_lines: counts.horizontal,
            vertical_lines: counts.vertical,
            total_colors: grid.colors().count(),
            max_pattern_size: grid.patterns().map(|pattern| pattern.size()).max().unwrap_or(0),
            transitions: grid.calculate_transitions(),
            avg_pattern_size,
        }
    }

    /// Fraction of patterns removed relative to `before`
    pub fn reduction_from(&self, before: &Self) -> f64 {
        if before.total_patterns == 0 {
            return 0.0;
        }
        1.0 - self.total_patterns as f64 / before.total_patterns as f64
    }
}
