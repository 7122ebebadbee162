//! Energy of a pattern configuration and its exact local change

use std::collections::BTreeSet;

use serde::Serialize;

use crate::io::configuration::{
    DEFAULT_PATTERN_WEIGHT, DEFAULT_SINGLE_PENALTY, DEFAULT_TRANSITION_WEIGHT,
};
use crate::spatial::grid::Grid;
use crate::spatial::pattern::{Pattern, PatternType, Position};

/// Weights of the three cost terms
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostWeights {
    /// Cost per live pattern
    pub pattern_weight: f64,
    /// Extra cost per single-pixel pattern
    pub single_penalty: f64,
    /// Cost per boundary between two patterns
    pub transition_weight: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self {
            pattern_weight: DEFAULT_PATTERN_WEIGHT,
            single_penalty: DEFAULT_SINGLE_PENALTY,
            transition_weight: DEFAULT_TRANSITION_WEIGHT,
        }
    }
}

/// Scores grids; lower is better
///
/// Costs are never cached: `calculate` recomputes from the grid every time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostFunction {
    weights: CostWeights,
}

impl CostFunction {
    /// Create a cost function with the given weights
    pub const fn new(weights: CostWeights) -> Self {
        Self { weights }
    }

    /// Weights in use
    pub const fn weights(&self) -> &CostWeights {
        &self.weights
    }

    /// Total cost of the grid
    pub fn calculate(&self, grid: &Grid) -> f64 {
        let counts = grid.pattern_counts();
        let transitions = grid.calculate_transitions();

        counts.total() as f64 * self.weights.pattern_weight
            + counts.single as f64 * self.weights.single_penalty
            + transitions as f64 * self.weights.transition_weight
    }

    /// Cost change caused by replacing `removed` with `added`
    ///
    /// `grid` must already reflect the change. Only pixel pairs touching the
    /// edited pixels are inspected, so the result equals the difference of two
    /// full `calculate` calls.
    pub fn calculate_delta(
        &self,
        grid: &Grid,
        removed: &[Pattern],
        added: &[Pattern],
        affected_positions: &BTreeSet<Position>,
    ) -> f64 {
        let pattern_delta = added.len() as f64 - removed.len() as f64;
        let single_delta = count_singles(added) as f64 - count_singles(removed) as f64;
        let transition_delta = transition_delta(grid, removed, added, affected_positions);

        pattern_delta * self.weights.pattern_weight
            + single_delta * self.weights.single_penalty
            + transition_delta as f64 * self.weights.transition_weight
    }
}

fn count_singles(patterns: &[Pattern]) -> usize {
    patterns
        .iter()
        .filter(|pattern| pattern.pattern_type() == PatternType::Single)
        .count()
}

/// Change in `Grid::calculate_transitions` caused by an edit already applied to `grid`
pub fn transition_delta(
    grid: &Grid,
    removed: &[Pattern],
    added: &[Pattern],
    affected_positions: &BTreeSet<Position>,
) -> i64 {
    let mut region: BTreeSet<Position> = affected_positions.clone();
    for pattern in removed.iter().chain(added) {
        region.extend(pattern.pixels());
    }

    // Each pair is keyed by its left/upper cell and its right/lower cell
    let mut pairs = BTreeSet::new();
    for &pos in &region {
        pairs.insert((pos, pos.offset(1, 0)));
        pairs.insert((pos, pos.offset(0, 1)));
        pairs.insert((pos.offset(-1, 0), pos));
        pairs.insert((pos.offset(0, -1), pos));
    }

    let owner_before = |pos: Position| -> Option<Pattern> {
        if let Some(pattern) = removed.iter().find(|pattern| pattern.contains(pos)) {
            return Some(*pattern);
        }
        if added.iter().any(|pattern| pattern.contains(pos)) {
            return None;
        }
        grid.pattern_at(pos)
    };

    let is_boundary =
        |a: Option<Pattern>, b: Option<Pattern>| matches!((a, b), (Some(a), Some(b)) if a != b);

    let mut delta = 0_i64;
    for (first, second) in pairs {
        let after = is_boundary(grid.pattern_at(first), grid.pattern_at(second));
        let before = is_boundary(owner_before(first), owner_before(second));
        delta += i64::from(after) - i64::from(before);
    }
    delta
}
