//! Tests for grid summary statistics

#[cfg(test)]
mod tests {
    use pixelruns::analysis::statistics::GridStatistics;
    use pixelruns::spatial::grid::Grid;
    use pixelruns::spatial::pattern::{Pattern, PatternType, Position};

    // Tests every statistic on a small mixed grid
    #[test]
    fn test_calculate_mixed_grid() {
        let mut grid = Grid::new(4, 2);
        assert!(
            grid.add_pattern(Pattern::new(Position::new(0, 0), 0, PatternType::Horizontal, 3))
                .is_valid()
        );
        assert!(
            grid.add_pattern(Pattern::new(Position::new(3, 0), 1, PatternType::Vertical, 2))
                .is_valid()
        );
        assert!(grid.add_pattern(Pattern::single(Position::new(0, 1), 0)).is_valid());

        let stats = GridStatistics::calculate(&grid);
        assert_eq!(stats.total_patterns, 3);
        assert_eq!(stats.total_pixels, 6);
        assert_eq!(stats.single_pixels, 1);
        assert_eq!(stats.horizontal_lines, 1);
        assert_eq!(stats.vertical_lines, 1);
        assert_eq!(stats.total_colors, 2);
        assert_eq!(stats.max_pattern_size, 3);
        assert_eq!(stats.transitions, 2);
        assert!((stats.avg_pattern_size - 2.0).abs() < f64::EPSILON);
    }

    // Tests that an empty grid has all-zero statistics
    #[test]
    fn test_calculate_empty_grid() {
        assert_eq!(GridStatistics::calculate(&Grid::new(3, 3)), GridStatistics::default());
    }

    // Tests the pattern reduction ratio
    #[test]
    fn test_reduction_from() {
        let before = GridStatistics {
            total_patterns: 10,
            ..GridStatistics::default()
        };
        let after = GridStatistics {
            total_patterns: 4,
            ..GridStatistics::default()
        };

        assert!((after.reduction_from(&before) - 0.6).abs() < 1e-12);
        assert!(after.reduction_from(&GridStatistics::default()).abs() < f64::EPSILON);
    }
}
