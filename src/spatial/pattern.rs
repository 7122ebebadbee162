//! Immutable pattern values and their geometric algebra
//!
//! A pattern is a single pixel or a one-dimensional run of same-coloured pixels.
//! Geometry changes never mutate a pattern: merging and splitting produce new
//! values, and the grid swaps them in and out.

use std::collections::BTreeSet;

use crate::io::error::{AlgorithmError, Result, invalid_parameter};
use crate::spatial::grid::{Grid, ValidationResult};

/// Opaque colour identifier assigned by the palette collaborator
pub type ColorIndex = u32;

/// Run length of a pattern (always at least 1)
pub type PatternSize = u32;

/// Integer canvas coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Position {
    /// Column, growing to the right
    pub x: i32,
    /// Row, growing downwards
    pub y: i32,
}

impl Position {
    /// Create a position from column and row
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by the given delta
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Shape of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatternType {
    /// One pixel
    Single,
    /// Run along the x axis
    Horizontal,
    /// Run along the y axis
    Vertical,
}

impl PatternType {
    /// Numeric code used by the text encoding (0, 1, 2)
    pub const fn code(self) -> u8 {
        match self {
            Self::Single => 0,
            Self::Horizontal => 1,
            Self::Vertical => 2,
        }
    }

    /// Whether this is a horizontal or vertical run
    pub const fn is_line(self) -> bool {
        !matches!(self, Self::Single)
    }
}

/// Orthogonal direction from one pattern towards another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards smaller y
    Up,
    /// Towards larger x
    Right,
    /// Towards larger y
    Down,
    /// Towards smaller x
    Left,
}

impl Direction {
    /// Order in which adjacency checks visit neighbours
    pub const ALL: [Self; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Unit step `(dx, dy)` for this direction
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
        }
    }

    /// Whether the direction lies along the x axis
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }
}

/// Immutable pattern value with structural equality
///
/// Ordering is derived so that pattern sets iterate deterministically, which
/// keeps seeded runs reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pattern {
    position: Position,
    color: ColorIndex,
    pattern_type: PatternType,
    size: PatternSize,
}

impl Pattern {
    /// Create a pattern anchored at its top-left pixel
    ///
    /// Singles always have size 1 and lines at least 1.
    pub const fn new(
        position: Position,
        color: ColorIndex,
        pattern_type: PatternType,
        size: PatternSize,
    ) -> Self {
        let size = match pattern_type {
            PatternType::Single => 1,
            PatternType::Horizontal | PatternType::Vertical => {
                if size == 0 {
                    1
                } else {
                    size
                }
            }
        };
        Self {
            position,
            color,
            pattern_type,
            size,
        }
    }

    /// Create a single-pixel pattern
    pub const fn single(position: Position, color: ColorIndex) -> Self {
        Self::new(position, color, PatternType::Single, 1)
    }

    /// Anchor (top-left pixel)
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Colour of every covered pixel
    pub const fn color(&self) -> ColorIndex {
        self.color
    }

    /// Shape of the pattern
    pub const fn pattern_type(&self) -> PatternType {
        self.pattern_type
    }

    /// Number of covered pixels
    pub const fn size(&self) -> PatternSize {
        self.size
    }

    /// Smallest covered x
    pub const fn min_x(&self) -> i32 {
        self.position.x
    }

    /// Largest covered x
    pub const fn max_x(&self) -> i32 {
        match self.pattern_type {
            PatternType::Horizontal => self.position.x + self.size as i32 - 1,
            PatternType::Single | PatternType::Vertical => self.position.x,
        }
    }

    /// Smallest covered y
    pub const fn min_y(&self) -> i32 {
        self.position.y
    }

    /// Largest covered y
    pub const fn max_y(&self) -> i32 {
        match self.pattern_type {
            PatternType::Vertical => self.position.y + self.size as i32 - 1,
            PatternType::Single | PatternType::Horizontal => self.position.y,
        }
    }

    /// Covered pixels in ascending run order
    pub fn pixels(self) -> impl Iterator<Item = Position> {
        let Self {
            position,
            pattern_type,
            size,
            ..
        } = self;
        (0..size as i32).map(move |step| match pattern_type {
            PatternType::Single => position,
            PatternType::Horizontal => position.offset(step, 0),
            PatternType::Vertical => position.offset(0, step),
        })
    }

    /// Covered pixels as a set
    pub fn pixel_set(self) -> BTreeSet<Position> {
        self.pixels().collect()
    }

    /// Whether `pos` is one of the covered pixels
    pub const fn contains(&self, pos: Position) -> bool {
        pos.x >= self.min_x() && pos.x <= self.max_x() && pos.y >= self.min_y() && pos.y <= self.max_y()
    }

    /// Whether the two patterns share at least one pixel
    pub fn overlaps_with(&self, other: &Self) -> bool {
        self.pixels().any(|pos| other.contains(pos))
    }

    /// Direction of a direct edge contact from `self` to `other`
    ///
    /// With a grid, the contacted cell must lie on the canvas and must not be
    /// owned by a third pattern.
    pub fn is_adjacent_to(&self, other: &Self, grid: Option<&Grid>) -> Option<Direction> {
        for pixel in self.pixels() {
            for direction in Direction::ALL {
                let (dx, dy) = direction.delta();
                let neighbor = pixel.offset(dx, dy);
                if !other.contains(neighbor) || self.contains(neighbor) {
                    continue;
                }
                if let Some(grid) = grid {
                    if !grid.is_within_bounds(neighbor) {
                        continue;
                    }
                    let obstructed = grid
                        .pattern_at(neighbor)
                        .is_some_and(|owner| owner != *self && owner != *other);
                    if obstructed {
                        continue;
                    }
                }
                return Some(direction);
            }
        }
        None
    }

    /// Whether `self` and `other` can be fused into one pattern
    pub fn can_merge_with(&self, other: &Self, grid: Option<&Grid>) -> bool {
        self.merge_direction(other, grid).is_some()
    }

    /// Adjacency direction when the pair is shape-compatible for a merge
    fn merge_direction(&self, other: &Self, grid: Option<&Grid>) -> Option<Direction> {
        if self.color != other.color || self == other {
            return None;
        }
        let direction = self.is_adjacent_to(other, grid)?;

        let compatible = match (self.pattern_type, other.pattern_type) {
            (PatternType::Single, PatternType::Single) => true,
            (PatternType::Single, _) => Self::single_extends_line(self, other),
            (_, PatternType::Single) => Self::single_extends_line(other, self),
            (PatternType::Horizontal, PatternType::Horizontal) => {
                self.min_y() == other.min_y()
                    && (self.max_x() + 1 == other.min_x() || other.max_x() + 1 == self.min_x())
            }
            (PatternType::Vertical, PatternType::Vertical) => {
                self.min_x() == other.min_x()
                    && (self.max_y() + 1 == other.min_y() || other.max_y() + 1 == self.min_y())
            }
            _ => false,
        };

        compatible.then_some(direction)
    }

    // Single must sit just before or just after the line on the line's own axis
    const fn single_extends_line(single: &Self, line: &Self) -> bool {
        match line.pattern_type {
            PatternType::Horizontal => {
                single.min_y() == line.min_y()
                    && (single.min_x() == line.min_x() - 1
                        || single.min_x() == line.min_x() + line.size as i32)
            }
            PatternType::Vertical => {
                single.min_x() == line.min_x()
                    && (single.min_y() == line.min_y() - 1
                        || single.min_y() == line.min_y() + line.size as i32)
            }
            PatternType::Single => false,
        }
    }

    /// Fuse two patterns into one run
    ///
    /// Returns `None` when the pair is not mergeable, when the candidate does not
    /// cover exactly the union of both operands, or, with a grid, when the grid
    /// rejects the placement or the merge would close off a larger orthogonal
    /// merge at the new run's far end.
    pub fn merge_with(&self, other: &Self, grid: Option<&Grid>) -> Option<Self> {
        let direction = self.merge_direction(other, grid)?;

        let merged_type = match (self.pattern_type, other.pattern_type) {
            (PatternType::Single, PatternType::Single) => {
                if direction.is_horizontal() {
                    PatternType::Horizontal
                } else {
                    PatternType::Vertical
                }
            }
            (PatternType::Single, line) | (line, _) => line,
        };
        let merged = Self::spanning(merged_type, self, other);

        let mut union = self.pixel_set();
        union.extend(other.pixels());
        if merged.pixel_set() != union {
            return None;
        }

        if let Some(grid) = grid {
            if grid.validate_merge(self, other, &merged) != ValidationResult::Valid {
                return None;
            }
            if self.blocks_orthogonal_merge(other, &merged, grid) {
                return None;
            }
        }

        Some(merged)
    }

    // Bounding run of both operands along the axis of `pattern_type`
    fn spanning(pattern_type: PatternType, a: &Self, b: &Self) -> Self {
        match pattern_type {
            PatternType::Horizontal => {
                let start = a.min_x().min(b.min_x());
                let end = a.max_x().max(b.max_x());
                Self::new(
                    Position::new(start, a.min_y()),
                    a.color,
                    pattern_type,
                    (end - start + 1) as PatternSize,
                )
            }
            PatternType::Vertical => {
                let start = a.min_y().min(b.min_y());
                let end = a.max_y().max(b.max_y());
                Self::new(
                    Position::new(a.min_x(), start),
                    a.color,
                    pattern_type,
                    (end - start + 1) as PatternSize,
                )
            }
            PatternType::Single => Self::single(a.position, a.color),
        }
    }

    // Heuristic veto: the far end of the new run would separate two same-colour
    // patterns that could otherwise join across it
    fn blocks_orthogonal_merge(&self, other: &Self, merged: &Self, grid: &Grid) -> bool {
        let (side_a, side_b) = match merged.pattern_type {
            PatternType::Vertical => {
                let end = Position::new(merged.min_x(), merged.max_y());
                (end.offset(-1, 0), end.offset(1, 0))
            }
            PatternType::Horizontal => {
                let end = Position::new(merged.max_x(), merged.min_y());
                (end.offset(0, -1), end.offset(0, 1))
            }
            PatternType::Single => return false,
        };

        if !grid.is_within_bounds(side_a) || !grid.is_within_bounds(side_b) {
            return false;
        }

        let is_foreign_match = |candidate: Option<Self>| {
            candidate.is_some_and(|p| p.color == self.color && p != *self && p != *other)
        };
        is_foreign_match(grid.pattern_at(side_a)) && is_foreign_match(grid.pattern_at(side_b))
    }

    /// Split a line into runs of `index` and `size - index` pixels
    ///
    /// With a grid, each half must be placeable once `self` is taken off the
    /// canvas.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The pattern is a single pixel
    /// - `index` is not strictly between 0 and the pattern size
    /// - A supplied grid rejects either half
    pub fn split_at(&self, index: PatternSize, grid: Option<&Grid>) -> Result<(Self, Self)> {
        if self.pattern_type == PatternType::Single {
            return Err(invalid_parameter(
                "split index",
                &index,
                &"single-pixel patterns cannot be split",
            ));
        }
        if index == 0 || index >= self.size {
            return Err(invalid_parameter(
                "split index",
                &index,
                &format!("must lie strictly between 0 and {}", self.size),
            ));
        }

        let head = Self::new(self.position, self.color, self.pattern_type, index);
        let tail_position = match self.pattern_type {
            PatternType::Horizontal => self.position.offset(index as i32, 0),
            PatternType::Vertical | PatternType::Single => self.position.offset(0, index as i32),
        };
        let tail = Self::new(
            tail_position,
            self.color,
            self.pattern_type,
            self.size - index,
        );

        if let Some(grid) = grid {
            for half in [head, tail] {
                let validation = grid.validate_replacement(&half, &[*self]);
                if validation != ValidationResult::Valid {
                    return Err(AlgorithmError::InvalidPlacement { validation });
                }
            }
        }

        Ok((head, tail))
    }

    /// One single-pixel pattern per covered pixel
    pub fn break_into_singles(&self) -> Vec<Self> {
        let color = self.color;
        self.pixels().map(|pos| Self::single(pos, color)).collect()
    }
}
