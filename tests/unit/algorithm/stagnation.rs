//! Tests for stagnation counting and phase switching

#[cfg(test)]
mod tests {
    use pixelruns::algorithm::stagnation::{Phase, StagnationMonitor, relative_change};

    // Tests that three stagnant stages trigger exactly one interlude
    // Verified by not resetting the phase after an interlude
    #[test]
    fn test_interlude_after_patience_exhausted() {
        let mut monitor = StagnationMonitor::default();

        assert_eq!(monitor.next_phase(100.0), Phase::Annealing);
        assert_eq!(monitor.next_phase(99.0), Phase::Annealing);
        assert_eq!(monitor.next_phase(98.5), Phase::Annealing);
        assert_eq!(monitor.next_phase(98.0), Phase::ClusterInterlude);
        assert_eq!(monitor.stagnant_stages(), 0);
        // The interlude stage is compared against the last annealing stage
        assert_eq!(monitor.previous_cost(), Some(98.5));

        assert_eq!(monitor.next_phase(97.9), Phase::Annealing);
        assert_eq!(monitor.phase(), Phase::Annealing);
    }

    // Tests that a large improvement resets the stagnation count
    #[test]
    fn test_progress_resets_count() {
        let mut monitor = StagnationMonitor::default();

        monitor.next_phase(100.0);
        monitor.next_phase(99.0);
        monitor.next_phase(98.0);
        assert_eq!(monitor.stagnant_stages(), 2);

        assert_eq!(monitor.next_phase(50.0), Phase::Annealing);
        assert_eq!(monitor.stagnant_stages(), 0);
    }

    // Tests that an interlude is never directly followed by another one
    #[test]
    fn test_no_back_to_back_interludes() {
        let mut monitor = StagnationMonitor::new(0.5, 1);

        assert_eq!(monitor.next_phase(10.0), Phase::Annealing);
        assert_eq!(monitor.next_phase(10.0), Phase::ClusterInterlude);
        assert_eq!(monitor.next_phase(10.0), Phase::Annealing);
        assert_eq!(monitor.next_phase(10.0), Phase::ClusterInterlude);
    }

    // Tests that a zero patience behaves like one
    #[test]
    fn test_zero_patience() {
        let mut monitor = StagnationMonitor::new(0.1, 0);

        monitor.next_phase(1.0);
        assert_eq!(monitor.next_phase(1.0), Phase::ClusterInterlude);
    }

    // Tests relative change including a zero baseline
    #[test]
    fn test_relative_change() {
        assert!((relative_change(90.0, 100.0) - 0.1).abs() < 1e-12);
        assert!((relative_change(110.0, 100.0) - 0.1).abs() < 1e-12);
        assert!(relative_change(0.0, 0.0).abs() < f64::EPSILON);
        assert!(relative_change(1.0, 0.0).is_infinite());
    }
}
