//! Tests for pattern geometry, adjacency, merging and splitting

#[cfg(test)]
mod tests {
    use pixelruns::AlgorithmError;
    use pixelruns::spatial::grid::{Grid, ValidationResult};
    use pixelruns::spatial::pattern::{Direction, Pattern, PatternType, Position};

    fn single(x: i32, y: i32, color: u32) -> Pattern {
        Pattern::single(Position::new(x, y), color)
    }

    fn line(x: i32, y: i32, color: u32, pattern_type: PatternType, size: u32) -> Pattern {
        Pattern::new(Position::new(x, y), color, pattern_type, size)
    }

    // Tests that constructors normalise the size of singles and empty lines
    // Verified by passing the size through unchanged
    #[test]
    fn test_new_normalises_size() {
        assert_eq!(line(0, 0, 1, PatternType::Single, 7).size(), 1);
        assert_eq!(line(0, 0, 1, PatternType::Horizontal, 0).size(), 1);
        assert_eq!(line(0, 0, 1, PatternType::Vertical, 4).size(), 4);
    }

    // Tests pixel enumeration and extents of each shape
    #[test]
    fn test_pixels_and_extents() {
        let horizontal = line(2, 3, 0, PatternType::Horizontal, 3);
        assert_eq!(
            horizontal.pixels().collect::<Vec<_>>(),
            vec![Position::new(2, 3), Position::new(3, 3), Position::new(4, 3)]
        );
        assert_eq!((horizontal.min_x(), horizontal.max_x()), (2, 4));
        assert_eq!((horizontal.min_y(), horizontal.max_y()), (3, 3));

        let vertical = line(1, 1, 0, PatternType::Vertical, 2);
        assert_eq!(vertical.pixel_set().len(), 2);
        assert!(vertical.contains(Position::new(1, 2)));
        assert!(!vertical.contains(Position::new(1, 3)));

        assert_eq!(single(5, 5, 0).pixels().count(), 1);
    }

    // Tests overlap detection between crossing and disjoint runs
    #[test]
    fn test_overlaps_with() {
        let horizontal = line(0, 1, 0, PatternType::Horizontal, 3);
        let crossing = line(1, 0, 0, PatternType::Vertical, 3);
        let beside = line(3, 0, 0, PatternType::Vertical, 3);

        assert!(horizontal.overlaps_with(&crossing));
        assert!(crossing.overlaps_with(&horizontal));
        assert!(!horizontal.overlaps_with(&beside));
    }

    // Tests that two adjacent same-colour singles merge into a horizontal pair
    // Verified by swapping the horizontal and vertical result types
    #[test]
    fn test_merge_two_singles_horizontally() {
        let left = single(0, 0, 1);
        let right = single(1, 0, 1);

        assert!(left.can_merge_with(&right, None));
        let merged = left.merge_with(&right, None);
        assert_eq!(
            merged,
            Some(line(0, 0, 1, PatternType::Horizontal, 2)),
            "Adjacent singles should fuse into a horizontal run anchored at the left pixel"
        );
        assert_eq!(right.merge_with(&left, None), merged);
    }

    // Tests that vertically stacked singles produce a vertical run
    #[test]
    fn test_merge_two_singles_vertically() {
        let top = single(4, 2, 3);
        let bottom = single(4, 3, 3);

        assert_eq!(
            bottom.merge_with(&top, None),
            Some(line(4, 2, 3, PatternType::Vertical, 2))
        );
    }

    // Tests that patterns of different colours never merge
    // Verified by removing the colour comparison
    #[test]
    fn test_different_colors_cannot_merge() {
        let a = single(0, 0, 1);
        let b = single(1, 0, 2);
        let c = single(0, 1, 2);

        assert!(!a.can_merge_with(&b, None));
        assert!(!a.can_merge_with(&c, None));
        assert!(a.merge_with(&b, None).is_none());
    }

    // Tests that a single extends a line only at the ends of its axis
    #[test]
    fn test_single_extends_line_on_axis_only() {
        let run = line(1, 1, 0, PatternType::Horizontal, 2);

        assert_eq!(
            run.merge_with(&single(3, 1, 0), None),
            Some(line(1, 1, 0, PatternType::Horizontal, 3))
        );
        assert_eq!(
            single(0, 1, 0).merge_with(&run, None),
            Some(line(0, 1, 0, PatternType::Horizontal, 3))
        );
        assert!(!run.can_merge_with(&single(1, 0, 0), None));
        assert!(!run.can_merge_with(&single(4, 1, 0), None));
    }

    // Tests that lines merge only with collinear, touching lines of the same orientation
    #[test]
    fn test_line_merges() {
        let left = line(0, 0, 0, PatternType::Horizontal, 2);
        let right = line(2, 0, 0, PatternType::Horizontal, 3);
        assert_eq!(
            left.merge_with(&right, None),
            Some(line(0, 0, 0, PatternType::Horizontal, 5))
        );

        let upper = line(0, 0, 0, PatternType::Vertical, 2);
        let offset_row = line(1, 1, 0, PatternType::Horizontal, 2);
        assert!(!upper.can_merge_with(&offset_row, None));

        let lower = line(0, 2, 0, PatternType::Vertical, 1);
        assert!(upper.can_merge_with(&lower, None));
    }

    // Tests the direction reported for edge contact and its absence for diagonals
    #[test]
    fn test_is_adjacent_to_directions() {
        let center = single(1, 1, 0);

        assert_eq!(center.is_adjacent_to(&single(1, 0, 0), None), Some(Direction::Up));
        assert_eq!(center.is_adjacent_to(&single(2, 1, 0), None), Some(Direction::Right));
        assert_eq!(center.is_adjacent_to(&single(1, 2, 0), None), Some(Direction::Down));
        assert_eq!(center.is_adjacent_to(&single(0, 1, 0), None), Some(Direction::Left));
        assert_eq!(center.is_adjacent_to(&single(2, 2, 0), None), None);
        assert_eq!(center.is_adjacent_to(&center, None), None);
    }

    // Tests that a grid rejects contact through cells owned by a third pattern
    // Verified by ignoring the grid argument
    #[test]
    fn test_is_adjacent_to_respects_grid_ownership() {
        let mut grid = Grid::new(3, 1);
        let a = single(0, 0, 0);
        let b = single(1, 0, 0);
        let intruder = single(1, 0, 5);
        assert!(grid.add_pattern(a).is_valid());
        assert!(grid.add_pattern(intruder).is_valid());

        assert_eq!(a.is_adjacent_to(&b, None), Some(Direction::Right));
        assert_eq!(a.is_adjacent_to(&b, Some(&grid)), None);
    }

    // Tests the heuristic veto against closing off an orthogonal merge
    // Verified by removing the blocks_orthogonal_merge check
    #[test]
    fn test_merge_vetoed_when_far_end_separates_same_color_pair() {
        let mut grid = Grid::new(3, 3);
        let a = single(0, 1, 7);
        let b = single(1, 1, 7);
        let above = single(1, 0, 7);
        let below = single(1, 2, 7);
        for pattern in [a, b, above, below] {
            assert!(grid.add_pattern(pattern).is_valid());
        }

        assert!(a.merge_with(&b, None).is_some());
        assert!(
            a.merge_with(&b, Some(&grid)).is_none(),
            "Merge ending between two same-colour patterns should be vetoed"
        );
    }

    // Tests that a merge is allowed when only one side of the far end matches
    #[test]
    fn test_merge_allowed_with_grid_when_not_blocking() {
        let mut grid = Grid::new(3, 3);
        let a = single(0, 1, 7);
        let b = single(1, 1, 7);
        let above = single(1, 0, 7);
        for pattern in [a, b, above] {
            assert!(grid.add_pattern(pattern).is_valid());
        }

        assert_eq!(
            a.merge_with(&b, Some(&grid)),
            Some(line(0, 1, 7, PatternType::Horizontal, 2))
        );
    }

    // Tests splitting a horizontal run of 5 at index 2
    // Verified by off-by-one in the tail anchor
    #[test]
    fn test_split_horizontal_five_at_two() {
        let run = line(0, 0, 3, PatternType::Horizontal, 5);
        let (head, tail) = run.split_at(2, None).expect("split should succeed");

        assert_eq!(head, line(0, 0, 3, PatternType::Horizontal, 2));
        assert_eq!(tail, line(2, 0, 3, PatternType::Horizontal, 3));

        let mut union = head.pixel_set();
        union.extend(tail.pixels());
        assert_eq!(union, run.pixel_set());
    }

    // Tests that vertical splits advance along y
    #[test]
    fn test_split_vertical() {
        let run = line(4, 1, 0, PatternType::Vertical, 3);
        let (head, tail) = run.split_at(1, None).expect("split should succeed");

        assert_eq!(head.size(), 1);
        assert_eq!(tail.position(), Position::new(4, 2));
        assert_eq!(tail.size(), 2);
    }

    // Tests the invalid-argument failures of split_at
    #[test]
    fn test_split_rejects_invalid_requests() {
        let run = line(0, 0, 0, PatternType::Horizontal, 5);

        assert!(matches!(
            single(0, 0, 0).split_at(1, None),
            Err(AlgorithmError::InvalidParameter { .. })
        ));
        assert!(matches!(
            run.split_at(0, None),
            Err(AlgorithmError::InvalidParameter { .. })
        ));
        assert!(matches!(
            run.split_at(5, None),
            Err(AlgorithmError::InvalidParameter { .. })
        ));
    }

    // Tests that a grid check passes while the parent still owns the pixels
    #[test]
    fn test_split_with_grid_ignores_parent() {
        let mut grid = Grid::new(5, 1);
        let run = line(0, 0, 0, PatternType::Horizontal, 5);
        assert!(grid.add_pattern(run).is_valid());

        assert!(run.split_at(3, Some(&grid)).is_ok());
    }

    // Tests that a grid rejects halves that fall off the canvas
    #[test]
    fn test_split_with_grid_rejects_out_of_bounds() {
        let grid = Grid::new(3, 1);
        let run = line(0, 0, 0, PatternType::Horizontal, 5);

        assert!(matches!(
            run.split_at(2, Some(&grid)),
            Err(AlgorithmError::InvalidPlacement {
                validation: ValidationResult::InvalidBounds
            })
        ));
    }

    // Tests that breaking a run yields one single per covered pixel
    #[test]
    fn test_break_into_singles() {
        let run = line(2, 0, 9, PatternType::Vertical, 3);
        let singles = run.break_into_singles();

        assert_eq!(
            singles,
            vec![single(2, 0, 9), single(2, 1, 9), single(2, 2, 9)]
        );
        assert!(
            singles
                .iter()
                .all(|pattern| pattern.pattern_type() == PatternType::Single)
        );
    }

    // Tests the numeric codes used by the text encoding
    #[test]
    fn test_pattern_type_codes() {
        assert_eq!(PatternType::Single.code(), 0);
        assert_eq!(PatternType::Horizontal.code(), 1);
        assert_eq!(PatternType::Vertical.code(), 2);
        assert!(!PatternType::Single.is_line());
        assert!(PatternType::Vertical.is_line());
    }
}
