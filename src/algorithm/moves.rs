//! Move proposals: pairwise merges and break-to-recombine
//!
//! A move is a pure description of `removed → added`. Applying and undoing go
//! through `Grid::swap_patterns`, so a rejected move leaves the grid untouched.

use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::io::configuration::{
    BREAK_WEIGHT_BASE, BREAK_WEIGHT_SLOPE, MERGE_WEIGHT_BASE, MERGE_WEIGHT_SLOPE,
};
use crate::math::probability::weighted_choice;
use crate::spatial::grid::{Grid, ValidationResult};
use crate::spatial::pattern::{Pattern, PatternType, Position};

/// Kind of structural change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    /// Two adjacent patterns fused into one run
    PatternMerge,
    /// A line broken into singles so neighbours can recombine later
    BreakRecombine,
}

/// Proposed replacement of some patterns by others
#[derive(Debug, Clone, PartialEq)]
pub struct Move {
    kind: MoveKind,
    patterns_removed: Vec<Pattern>,
    patterns_added: Vec<Pattern>,
    affected_positions: BTreeSet<Position>,
}

impl Move {
    /// Describe a move; the affected positions are every pixel of both sides
    pub fn new(kind: MoveKind, patterns_removed: Vec<Pattern>, patterns_added: Vec<Pattern>) -> Self {
        let affected_positions = patterns_removed
            .iter()
            .chain(&patterns_added)
            .flat_map(|pattern| pattern.pixels())
            .collect();
        Self {
            kind,
            patterns_removed,
            patterns_added,
            affected_positions,
        }
    }

    /// Kind of the move
    pub const fn kind(&self) -> MoveKind {
        self.kind
    }

    /// Patterns taken off the grid
    pub fn patterns_removed(&self) -> &[Pattern] {
        &self.patterns_removed
    }

    /// Patterns put on the grid
    pub fn patterns_added(&self) -> &[Pattern] {
        &self.patterns_added
    }

    /// Pixels whose ownership the move touches
    pub const fn affected_positions(&self) -> &BTreeSet<Position> {
        &self.affected_positions
    }

    /// Perform the move atomically
    pub fn apply(&self, grid: &mut Grid) -> ValidationResult {
        grid.swap_patterns(&self.patterns_removed, &self.patterns_added)
    }

    /// Revert a previously applied move
    pub fn undo(&self, grid: &mut Grid) -> ValidationResult {
        grid.swap_patterns(&self.patterns_added, &self.patterns_removed)
    }
}

/// Samples moves with temperature-dependent kind weights
///
/// Hot (ratio near 1) favours merges; cold favours break-and-recombine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveGenerator {
    temperature_ratio: f64,
}

impl Default for MoveGenerator {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl MoveGenerator {
    /// Create a generator for a position on the cooling curve, clamped to `[0, 1]`
    pub fn new(temperature_ratio: f64) -> Self {
        let temperature_ratio = if temperature_ratio.is_finite() {
            temperature_ratio.clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self { temperature_ratio }
    }

    /// Position on the cooling curve, 1 at the start and 0 at the end
    pub const fn temperature_ratio(&self) -> f64 {
        self.temperature_ratio
    }

    /// Selection weights of `[PatternMerge, BreakRecombine]`
    pub fn move_weights(&self) -> [f64; 2] {
        let ratio = self.temperature_ratio;
        [
            MERGE_WEIGHT_SLOPE.mul_add(ratio, MERGE_WEIGHT_BASE),
            BREAK_WEIGHT_SLOPE.mul_add(1.0 - ratio, BREAK_WEIGHT_BASE),
        ]
    }

    /// Propose a move of a randomly weighted kind, or `None` if that kind has no candidate
    pub fn generate_move<R: Rng + ?Sized>(&self, grid: &Grid, rng: &mut R) -> Option<Move> {
        match weighted_choice(rng, &self.move_weights()) {
            0 => Self::generate_merge_move(grid, rng),
            _ => Self::generate_break_move(grid, rng),
        }
    }

    /// Fuse the first shuffled pattern that has a mergeable neighbour
    pub fn generate_merge_move<R: Rng + ?Sized>(grid: &Grid, rng: &mut R) -> Option<Move> {
        if grid.len() < 2 {
            return None;
        }
        let mut patterns: Vec<Pattern> = grid.patterns().copied().collect();
        patterns.shuffle(rng);

        for pattern in patterns {
            let neighbors = grid.mergeable_neighbors(&pattern);
            let Some(neighbor) = neighbors.choose(rng) else {
                continue;
            };
            if let Some(merged) = pattern.merge_with(neighbor, Some(grid)) {
                return Some(Move::new(
                    MoveKind::PatternMerge,
                    vec![pattern, *neighbor],
                    vec![merged],
                ));
            }
        }
        None
    }

    /// Break a line that separates a same-coloured neighbour from a longer joint run
    ///
    /// For a line `P` and a same-coloured line neighbour `N`, the canvas is
    /// scanned outward from both ends of `N` along its axis, skipping empty cells
    /// and `P` itself. If the first other pattern `C` hit has the same colour and
    /// `N` and `C` would span more pixels than they cover, `P` is broken into
    /// singles.
    pub fn generate_break_move<R: Rng + ?Sized>(grid: &Grid, rng: &mut R) -> Option<Move> {
        let mut lines: Vec<Pattern> = grid
            .patterns()
            .filter(|pattern| pattern.pattern_type().is_line())
            .copied()
            .collect();
        lines.shuffle(rng);

        for pattern in lines {
            let enables_recombination = grid
                .adjacent_patterns(&pattern)
                .into_iter()
                .filter(|neighbor| neighbor.color() == pattern.color())
                .any(|neighbor| {
                    merge_candidates_across(grid, &pattern, &neighbor)
                        .into_iter()
                        .any(|candidate| {
                            merged_span(&neighbor, &candidate)
                                > neighbor.size() + candidate.size()
                        })
                });
            if enables_recombination {
                return Some(Move::new(
                    MoveKind::BreakRecombine,
                    vec![pattern],
                    pattern.break_into_singles(),
                ));
            }
        }
        None
    }
}

/// Same-coloured patterns first met when scanning out from both ends of `neighbor`
pub fn merge_candidates_across(grid: &Grid, blocker: &Pattern, neighbor: &Pattern) -> Vec<Pattern> {
    let (before, after, step) = match neighbor.pattern_type() {
        PatternType::Horizontal => (
            Position::new(neighbor.min_x() - 1, neighbor.min_y()),
            Position::new(neighbor.max_x() + 1, neighbor.min_y()),
            (1, 0),
        ),
        PatternType::Vertical => (
            Position::new(neighbor.min_x(), neighbor.min_y() - 1),
            Position::new(neighbor.min_x(), neighbor.max_y() + 1),
            (0, 1),
        ),
        PatternType::Single => return Vec::new(),
    };

    [
        scan_for_partner(grid, before, (-step.0, -step.1), blocker, neighbor),
        scan_for_partner(grid, after, step, blocker, neighbor),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn scan_for_partner(
    grid: &Grid,
    start: Position,
    (dx, dy): (i32, i32),
    blocker: &Pattern,
    neighbor: &Pattern,
) -> Option<Pattern> {
    let mut pos = start;
    while grid.is_within_bounds(pos) {
        match grid.pattern_at(pos) {
            Some(owner) if owner != *blocker => {
                return (owner.color() == neighbor.color() && owner != *neighbor).then_some(owner);
            }
            _ => pos = pos.offset(dx, dy),
        }
    }
    None
}

/// Extent of `a` and `b` together along the axis of `a`
pub fn merged_span(a: &Pattern, b: &Pattern) -> u32 {
    let (low, high) = match a.pattern_type() {
        PatternType::Vertical => (a.min_y().min(b.min_y()), a.max_y().max(b.max_y())),
        PatternType::Horizontal | PatternType::Single => {
            (a.min_x().min(b.min_x()), a.max_x().max(b.max_x()))
        }
    };
    (high - low + 1).unsigned_abs()
}
