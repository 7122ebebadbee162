//! Tests for the annealing driver and its stage lifecycle

#[cfg(test)]
mod tests {
    use pixelruns::AlgorithmError;
    use pixelruns::algorithm::annealing::{
        AnnealingStats, OptimizerConfig, OptimizerState, PatternOptimizer,
    };
    use pixelruns::algorithm::cost::CostFunction;
    use pixelruns::algorithm::stagnation::Phase;
    use pixelruns::analysis::palette::ColorPalette;
    use pixelruns::io::visualization::SnapshotCapture;
    use pixelruns::spatial::grid::Grid;
    use pixelruns::spatial::pattern::{Pattern, PatternType, Position};

    fn collinear_singles() -> Grid {
        Grid::from_pixel_grid(
            vec![
                (Position::new(0, 0), 3),
                (Position::new(1, 0), 3),
                (Position::new(2, 0), 3),
            ],
            3,
            1,
        )
        .expect("valid pixels")
    }

    // Two colours in horizontal stripes with a notch, enough to need many stages
    fn striped(width: usize, height: usize) -> Grid {
        let pixels = (0..height).flat_map(move |y| {
            (0..width).filter_map(move |x| {
                (x + y != width).then_some((Position::new(x as i32, y as i32), (y % 2) as u32))
            })
        });
        Grid::from_pixel_grid(pixels, width, height).expect("valid pixels")
    }

    // Tests that three collinear pixels of one colour end as one horizontal run
    // Verified by disabling merges in the move generator
    #[test]
    fn test_three_pixels_converge_to_one_run() {
        let (best, stats) = PatternOptimizer::optimize(collinear_singles(), OptimizerConfig::default())
            .expect("valid config");

        assert_eq!(
            best.patterns().copied().collect::<Vec<_>>(),
            vec![Pattern::new(Position::new(0, 0), 3, PatternType::Horizontal, 3)]
        );
        assert!((stats.initial_cost - 19.0).abs() < 1e-9);
        assert!((stats.best_cost - 1.0).abs() < 1e-9);
        assert!(stats.temperature_stages > 0);
        assert!(stats.accepted_moves >= 2);
    }

    // Tests the state machine as stages are polled
    #[test]
    fn test_state_transitions() {
        let mut optimizer =
            PatternOptimizer::new(collinear_singles(), OptimizerConfig::default()).expect("valid config");
        assert_eq!(optimizer.state(), OptimizerState::Init);
        assert!(optimizer.calibration().is_none());

        let first = optimizer.execute_stage().expect("schedule is not empty");
        assert_eq!(first.stage, 1);
        assert_eq!(first.phase, Phase::Annealing);
        assert_eq!(optimizer.state(), OptimizerState::Annealing { stage: 1 });
        let calibration = optimizer.calibration().copied().expect("calibrated");
        assert_eq!(first.total_stages, calibration.stage_count);
        assert!(calibration.start_temperature > calibration.end_temperature);

        let mut last_stage = first.stage;
        while let Some(report) = optimizer.execute_stage() {
            assert_eq!(report.stage, last_stage + 1);
            assert!(report.best_cost <= report.current_cost + 1e-9);
            last_stage = report.stage;
        }
        assert_eq!(last_stage, calibration.stage_count);
        assert_eq!(optimizer.state(), OptimizerState::Done);
        assert!(optimizer.execute_stage().is_none());
    }

    // Tests that the best grid covers exactly the source pixels and never costs more
    #[test]
    fn test_best_grid_is_valid_and_no_worse() {
        let grid = striped(6, 5);
        let initial_pixels: Vec<Position> = {
            let mut pixels: Vec<Position> =
                grid.patterns().flat_map(|pattern| pattern.pixels()).collect();
            pixels.sort();
            pixels
        };
        let initial_cost = CostFunction::default().calculate(&grid);

        let (best, stats) =
            PatternOptimizer::optimize(grid, OptimizerConfig::default()).expect("valid config");

        let mut pixels: Vec<Position> = best.patterns().flat_map(|pattern| pattern.pixels()).collect();
        pixels.sort();
        assert_eq!(pixels, initial_pixels);
        assert!(best.is_consistent());
        assert!(stats.best_cost <= initial_cost);
        assert!((CostFunction::default().calculate(&best) - stats.best_cost).abs() < 1e-6);
    }

    // Tests that a fixed seed reproduces the same run
    // Verified by seeding from entropy
    #[test]
    fn test_seeded_runs_are_deterministic() {
        let config = OptimizerConfig {
            seed: 1234,
            ..OptimizerConfig::default()
        };
        let (first, first_stats) = PatternOptimizer::optimize(striped(5, 4), config).expect("valid config");
        let (second, second_stats) =
            PatternOptimizer::optimize(striped(5, 4), config).expect("valid config");

        assert_eq!(first, second);
        assert_eq!(first_stats.accepted_moves, second_stats.accepted_moves);
        assert_eq!(first_stats.rejected_moves, second_stats.rejected_moves);
        assert_eq!(first_stats.temperature_stages, second_stats.temperature_stages);
    }

    // Tests that an empty grid finishes immediately
    #[test]
    fn test_empty_grid() {
        let (best, stats) =
            PatternOptimizer::optimize(Grid::new(4, 4), OptimizerConfig::default()).expect("valid config");

        assert!(best.is_empty());
        assert_eq!(stats.temperature_stages, 0);
        assert!(stats.best_cost.abs() < f64::EPSILON);
    }

    // Tests the sampling fallback when no move exists
    #[test]
    fn test_sample_cost_deltas_fallback() {
        let grid = Grid::from_pixel_grid(vec![(Position::new(0, 0), 0)], 1, 1).expect("valid pixels");
        let mut optimizer = PatternOptimizer::new(grid, OptimizerConfig::default()).expect("valid config");

        let deltas = optimizer.sample_cost_deltas(5);
        assert_eq!(deltas.len(), 1);
        assert!((deltas.first().copied().unwrap_or_default() - 0.6).abs() < 1e-9);
        assert_eq!(optimizer.grid().len(), 1);
    }

    // Tests that sampling leaves the grid exactly as it found it
    #[test]
    fn test_sample_cost_deltas_undoes_moves() {
        let grid = striped(4, 3);
        let before = grid.clone();
        let mut optimizer = PatternOptimizer::new(grid, OptimizerConfig::default()).expect("valid config");

        let deltas = optimizer.sample_cost_deltas(20);
        assert!(!deltas.is_empty());
        assert_eq!(optimizer.grid(), &before);
    }

    // Tests that one frame is captured up front and one per stage
    #[test]
    fn test_snapshots_one_frame_per_stage() {
        let mut palette = ColorPalette::new();
        palette.index_or_insert([0, 0, 0, 255]);
        palette.index_or_insert([255, 0, 0, 255]);
        let mut optimizer =
            PatternOptimizer::new(striped(3, 2), OptimizerConfig::default()).expect("valid config");
        optimizer.enable_snapshots(SnapshotCapture::with_pixel_size(palette, 2).with_frame_limit(10_000));

        while optimizer.execute_stage().is_some() {}

        let frames = optimizer.snapshots().map_or(0, SnapshotCapture::frame_count);
        assert_eq!(frames, 1 + optimizer.stats().temperature_stages);
    }

    // Tests that interludes are reported and counted
    #[test]
    fn test_cluster_interludes_are_counted() {
        let config = OptimizerConfig {
            stagnation_threshold: 1.0,
            stagnation_patience: 1,
            ..OptimizerConfig::default()
        };
        let mut optimizer = PatternOptimizer::new(striped(5, 4), config).expect("valid config");

        let mut interludes = 0;
        while let Some(report) = optimizer.execute_stage() {
            if report.phase == Phase::ClusterInterlude {
                interludes += 1;
                assert!(report.cluster_result.is_some());
                assert_eq!(report.accepted_moves + report.rejected_moves, 0);
            }
        }
        assert!(interludes > 0);
        assert_eq!(optimizer.stats().cluster_stages, interludes);
    }

    // Tests rejection of invalid configurations
    #[test]
    fn test_invalid_config_rejected() {
        let mut negative = OptimizerConfig::default();
        negative.cost_weights.single_penalty = -1.0;
        assert!(matches!(
            PatternOptimizer::new(Grid::new(1, 1), negative),
            Err(AlgorithmError::InvalidParameter {
                parameter: "single_penalty",
                ..
            })
        ));

        let impatient = OptimizerConfig {
            stagnation_patience: 0,
            ..OptimizerConfig::default()
        };
        assert!(impatient.validate().is_err());

        let mut hot = OptimizerConfig::default();
        hot.temperature.alpha = 1.5;
        assert!(hot.validate().is_err());
    }

    // Tests the serialized name of the wall-time field
    #[test]
    fn test_stats_serialize_execution_time_in_seconds() {
        let stats = AnnealingStats {
            execution_time: std::time::Duration::from_millis(1500),
            ..AnnealingStats::default()
        };
        let json = serde_json::to_value(&stats).expect("stats serialize");

        assert_eq!(json["execution_time_secs"], 1.5);
        assert!(json.get("execution_time").is_none());
    }
}
