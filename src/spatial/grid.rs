//! Pattern ownership of a bounded canvas with spatial and colour indices
//!
//! The grid is the only mutable state of the optimizer. Every structural change
//! goes through `add_pattern`, `remove_pattern` or `swap_patterns`, which keep
//! three views in lockstep: the pattern set, the pixel ownership array and the
//! per-colour buckets. Pattern pixel sets never overlap and never leave the
//! canvas.

use std::collections::{BTreeMap, BTreeSet};

use ndarray::Array2;
use serde::Serialize;

use crate::io::error::{AlgorithmError, Result};
use crate::spatial::pattern::{ColorIndex, Pattern, PatternType, Position};

/// Outcome of a placement check or a structural change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationResult {
    /// The change is (or was) applied cleanly
    Valid,
    /// Some pixel falls outside the canvas
    InvalidBounds,
    /// Some pixel is already owned by another pattern
    InvalidOverlap,
    /// The operands of a merge do not share the result's colour
    InvalidColor,
}

impl ValidationResult {
    /// Whether the check succeeded
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Number of patterns of each shape
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PatternCounts {
    /// Single-pixel patterns
    pub single: usize,
    /// Horizontal runs
    pub horizontal: usize,
    /// Vertical runs
    pub vertical: usize,
}

impl PatternCounts {
    /// Count the shapes of the given patterns
    pub fn of<'a>(patterns: impl IntoIterator<Item = &'a Pattern>) -> Self {
        let mut counts = Self::default();
        for pattern in patterns {
            match pattern.pattern_type() {
                PatternType::Single => counts.single += 1,
                PatternType::Horizontal => counts.horizontal += 1,
                PatternType::Vertical => counts.vertical += 1,
            }
        }
        counts
    }

    /// All patterns regardless of shape
    pub const fn total(&self) -> usize {
        self.single + self.horizontal + self.vertical
    }
}

/// Axis-aligned inclusive bounding box in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// Minimum coordinates (inclusive)
    pub min: Position,
    /// Maximum coordinates (inclusive)
    pub max: Position,
}

impl BoundingBox {
    /// Box covering exactly one pattern
    pub const fn of_pattern(pattern: &Pattern) -> Self {
        Self {
            min: Position::new(pattern.min_x(), pattern.min_y()),
            max: Position::new(pattern.max_x(), pattern.max_y()),
        }
    }

    /// Smallest box covering `self` and `pattern`
    pub fn including(&self, pattern: &Pattern) -> Self {
        Self {
            min: Position::new(self.min.x.min(pattern.min_x()), self.min.y.min(pattern.min_y())),
            max: Position::new(self.max.x.max(pattern.max_x()), self.max.y.max(pattern.max_y())),
        }
    }

    /// Check if a position is within the bounds
    pub const fn contains(&self, pos: Position) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }

    /// Number of columns covered
    pub const fn width(&self) -> i32 {
        self.max.x - self.min.x + 1
    }

    /// Number of rows covered
    pub const fn height(&self) -> i32 {
        self.max.y - self.min.y + 1
    }

    /// Distance from a square shape, `|width - height|`
    pub const fn squareness(&self) -> i32 {
        (self.width() - self.height()).abs()
    }
}

/// Live pattern set of a `width × height` canvas
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    patterns: BTreeSet<Pattern>,
    /// Owner of each pixel, indexed `[y, x]`
    pixel_index: Array2<Option<Pattern>>,
    color_index: BTreeMap<ColorIndex, BTreeSet<Pattern>>,
}

impl Grid {
    /// Create an empty canvas
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            patterns: BTreeSet::new(),
            pixel_index: Array2::from_elem((height, width), None),
            color_index: BTreeMap::new(),
        }
    }

    /// Build the initial grid with one single-pixel pattern per coloured pixel
    ///
    /// # Errors
    ///
    /// Returns an error if a pixel lies outside the canvas or appears twice
    pub fn from_pixel_grid(
        pixels: impl IntoIterator<Item = (Position, ColorIndex)>,
        width: usize,
        height: usize,
    ) -> Result<Self> {
        let mut grid = Self::new(width, height);
        for (position, color) in pixels {
            let validation = grid.add_pattern(Pattern::single(position, color));
            if !validation.is_valid() {
                return Err(AlgorithmError::InvalidSourceData {
                    reason: format!(
                        "pixel ({}, {}) cannot be placed on a {width}x{height} canvas: {validation:?}",
                        position.x, position.y
                    ),
                });
            }
        }
        Ok(grid)
    }

    /// Canvas width in pixels
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Canvas height in pixels
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Number of live patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the grid holds no patterns
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Live patterns in deterministic order
    pub fn patterns(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    /// Whether `pattern` is a live member of the grid
    pub fn contains(&self, pattern: &Pattern) -> bool {
        self.patterns.contains(pattern)
    }

    /// Colours with at least one live pattern
    pub fn colors(&self) -> impl Iterator<Item = ColorIndex> + '_ {
        self.color_index.keys().copied()
    }

    /// Check if a position lies on the canvas
    pub const fn is_within_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    fn cell(&self, pos: Position) -> Option<[usize; 2]> {
        self.is_within_bounds(pos)
            .then_some([pos.y as usize, pos.x as usize])
    }

    fn pattern_within_bounds(&self, pattern: &Pattern) -> bool {
        self.is_within_bounds(Position::new(pattern.min_x(), pattern.min_y()))
            && self.is_within_bounds(Position::new(pattern.max_x(), pattern.max_y()))
    }

    /// Pattern owning `pos`, if any
    pub fn pattern_at(&self, pos: Position) -> Option<Pattern> {
        self.cell(pos)
            .and_then(|cell| self.pixel_index.get(cell).copied().flatten())
    }

    /// Snapshot of the live patterns of one colour
    pub fn patterns_by_color(&self, color: ColorIndex) -> BTreeSet<Pattern> {
        self.color_index.get(&color).cloned().unwrap_or_default()
    }

    /// Register a pattern, leaving the grid untouched on failure
    pub fn add_pattern(&mut self, pattern: Pattern) -> ValidationResult {
        if !self.pattern_within_bounds(&pattern) {
            return ValidationResult::InvalidBounds;
        }
        if pattern.pixels().any(|pos| self.pattern_at(pos).is_some()) {
            return ValidationResult::InvalidOverlap;
        }

        for pos in pattern.pixels() {
            if let Some(slot) = self.cell(pos).and_then(|cell| self.pixel_index.get_mut(cell)) {
                *slot = Some(pattern);
            }
        }
        self.patterns.insert(pattern);
        self.color_index
            .entry(pattern.color())
            .or_default()
            .insert(pattern);

        ValidationResult::Valid
    }

    /// Unregister a pattern; returns whether it was present
    pub fn remove_pattern(&mut self, pattern: &Pattern) -> bool {
        if !self.patterns.remove(pattern) {
            return false;
        }

        for pos in pattern.pixels() {
            if let Some(slot) = self.cell(pos).and_then(|cell| self.pixel_index.get_mut(cell)) {
                *slot = None;
            }
        }

        let emptied = self
            .color_index
            .get_mut(&pattern.color())
            .is_some_and(|bucket| {
                bucket.remove(pattern);
                bucket.is_empty()
            });
        if emptied {
            self.color_index.remove(&pattern.color());
        }

        true
    }

    /// Replace `removed` by `added` as one atomic step
    ///
    /// If any added pattern is rejected, the grid is restored to its state
    /// before the call and the rejection is returned.
    pub fn swap_patterns(&mut self, removed: &[Pattern], added: &[Pattern]) -> ValidationResult {
        let taken: Vec<Pattern> = removed
            .iter()
            .filter(|pattern| self.remove_pattern(pattern))
            .copied()
            .collect();

        for (placed, pattern) in added.iter().enumerate() {
            let validation = self.add_pattern(*pattern);
            if !validation.is_valid() {
                for earlier in added.iter().take(placed) {
                    self.remove_pattern(earlier);
                }
                for pattern in &taken {
                    self.add_pattern(*pattern);
                }
                return validation;
            }
        }

        ValidationResult::Valid
    }

    /// Distinct patterns touching `pattern` under 8-connectivity
    pub fn adjacent_patterns(&self, pattern: &Pattern) -> Vec<Pattern> {
        const NEIGHBORHOOD: [(i32, i32); 8] = [
            (0, 1),
            (1, 0),
            (0, -1),
            (-1, 0),
            (1, 1),
            (-1, 1),
            (1, -1),
            (-1, -1),
        ];

        let mut adjacent = BTreeSet::new();
        for pos in pattern.pixels() {
            for (dx, dy) in NEIGHBORHOOD {
                if let Some(neighbor) = self.pattern_at(pos.offset(dx, dy)) {
                    if neighbor != *pattern {
                        adjacent.insert(neighbor);
                    }
                }
            }
        }
        adjacent.into_iter().collect()
    }

    /// Adjacent patterns that `pattern` could merge with, ignoring grid context
    pub fn mergeable_neighbors(&self, pattern: &Pattern) -> Vec<Pattern> {
        self.adjacent_patterns(pattern)
            .into_iter()
            .filter(|neighbor| pattern.can_merge_with(neighbor, None))
            .collect()
    }

    /// Check that `pattern` fits on the canvas where only `ignored` may own its pixels
    pub fn validate_replacement(&self, pattern: &Pattern, ignored: &[Pattern]) -> ValidationResult {
        if !self.pattern_within_bounds(pattern) {
            return ValidationResult::InvalidBounds;
        }
        let foreign_owner = pattern.pixels().any(|pos| {
            self.pattern_at(pos)
                .is_some_and(|owner| !ignored.contains(&owner))
        });
        if foreign_owner {
            return ValidationResult::InvalidOverlap;
        }
        ValidationResult::Valid
    }

    /// Check that `pattern` could be placed (it may already own its own pixels)
    pub fn validate_pattern_placement(&self, pattern: &Pattern) -> ValidationResult {
        self.validate_replacement(pattern, &[*pattern])
    }

    /// Check that `merged` could replace `first` and `second`
    pub fn validate_merge(
        &self,
        first: &Pattern,
        second: &Pattern,
        merged: &Pattern,
    ) -> ValidationResult {
        if first.color() != merged.color() || second.color() != merged.color() {
            return ValidationResult::InvalidColor;
        }
        self.validate_replacement(merged, &[*first, *second])
    }

    /// Number of right/down neighbour pairs owned by two different patterns
    pub fn calculate_transitions(&self) -> usize {
        let mut transitions = 0;
        for ((row, col), owner) in self.pixel_index.indexed_iter() {
            let Some(owner) = owner else {
                continue;
            };
            for neighbor in [[row, col + 1], [row + 1, col]] {
                if let Some(Some(other)) = self.pixel_index.get(neighbor) {
                    if other != owner {
                        transitions += 1;
                    }
                }
            }
        }
        transitions
    }

    /// Single-pixel patterns
    pub fn singles(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns
            .iter()
            .filter(|pattern| pattern.pattern_type() == PatternType::Single)
    }

    /// Pattern count per shape
    pub fn pattern_counts(&self) -> PatternCounts {
        PatternCounts::of(&self.patterns)
    }

    /// Number of covered pixels
    pub fn pixel_count(&self) -> usize {
        self.patterns
            .iter()
            .map(|pattern| pattern.size() as usize)
            .sum()
    }

    /// Verify the disjoint-coverage invariant and both indices
    ///
    /// Intended for tests and debug assertions; walks the whole canvas.
    pub fn is_consistent(&self) -> bool {
        let mut expected = Array2::from_elem((self.height, self.width), None);
        for pattern in &self.patterns {
            if !self.pattern_within_bounds(pattern) {
                return false;
            }
            for pos in pattern.pixels() {
                let Some(slot) = expected.get_mut([pos.y as usize, pos.x as usize]) else {
                    return false;
                };
                if slot.is_some() {
                    return false;
                }
                *slot = Some(*pattern);
            }
        }
        if expected != self.pixel_index {
            return false;
        }

        let mut by_color: BTreeMap<ColorIndex, BTreeSet<Pattern>> = BTreeMap::new();
        for pattern in &self.patterns {
            by_color.entry(pattern.color()).or_default().insert(*pattern);
        }
        by_color == self.color_index
    }
}
