//! Tests for the relationships between configuration constants

#[cfg(test)]
mod tests {
    use pixelruns::io::configuration::{
        BREAK_WEIGHT_BASE, CLUSTER_SPLIT_THRESHOLD, DEFAULT_COOLING_RATE,
        DEFAULT_FINAL_ACCEPT_RATIO, DEFAULT_INITIAL_ACCEPT_RATIO, DEFAULT_MAX_ITERATIONS,
        DEFAULT_MIN_ITERATIONS, GIF_FRAME_DELAY_MS, MAX_SUB_CLUSTERS, MERGE_WEIGHT_BASE,
        MIN_SUB_CLUSTERS, PATTERNS_SUFFIX, SNAPSHOTS_SUFFIX, STATISTICS_SUFFIX,
        SUB_CLUSTER_BASE_RANGE, VIEWER_MIN_FRAME_DELAY_MS, VISUALIZATION_SUFFIX,
    };

    // Tests that the default schedule cools and stays within its iteration bounds
    #[test]
    fn test_schedule_defaults_are_consistent() {
        assert!(DEFAULT_COOLING_RATE > 0.0 && DEFAULT_COOLING_RATE < 1.0);
        assert!(DEFAULT_FINAL_ACCEPT_RATIO < DEFAULT_INITIAL_ACCEPT_RATIO);
        assert!(DEFAULT_MIN_ITERATIONS <= DEFAULT_MAX_ITERATIONS);
    }

    // Tests that sub-cluster bounds can always be met
    #[test]
    fn test_cluster_bounds_are_consistent() {
        let (low, high) = SUB_CLUSTER_BASE_RANGE;
        assert!(low <= high);
        assert!(MIN_SUB_CLUSTERS <= MAX_SUB_CLUSTERS);
        assert!(MIN_SUB_CLUSTERS <= CLUSTER_SPLIT_THRESHOLD);
    }

    // Tests that both move kinds keep a positive weight at every temperature
    #[test]
    fn test_move_weights_positive() {
        assert!(MERGE_WEIGHT_BASE > 0.0);
        assert!(BREAK_WEIGHT_BASE > 0.0);
    }

    // Tests that generated file names cannot collide
    #[test]
    fn test_output_suffixes_are_distinct() {
        let suffixes = [
            PATTERNS_SUFFIX,
            STATISTICS_SUFFIX,
            VISUALIZATION_SUFFIX,
            SNAPSHOTS_SUFFIX,
        ];
        for (i, a) in suffixes.iter().enumerate() {
            for b in suffixes.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
        assert!(VISUALIZATION_SUFFIX.ends_with(".png"));
    }

    // Tests that the default GIF delay triggers frame skipping in viewers
    #[test]
    fn test_gif_delay_below_viewer_minimum() {
        assert!(GIF_FRAME_DELAY_MS > 0);
        assert!(GIF_FRAME_DELAY_MS < VIEWER_MIN_FRAME_DELAY_MS);
    }
}
