//! Tests for acceptance probabilities and weighted sampling

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use pixelruns::math::probability::{
        accept_with_probability, metropolis_acceptance, temperature_for_acceptance,
        weighted_choice,
    };

    // Tests that improvements are always accepted and worsening moves decay with delta
    #[test]
    fn test_metropolis_acceptance() {
        assert!((metropolis_acceptance(-5.0, 1.0) - 1.0).abs() < f64::EPSILON);
        assert!((metropolis_acceptance(0.0, 1.0) - 1.0).abs() < f64::EPSILON);
        assert!((metropolis_acceptance(2.0, 4.0) - (-0.5_f64).exp()).abs() < 1e-12);
        assert!(metropolis_acceptance(1.0, 0.0).abs() < f64::EPSILON);
        assert!(metropolis_acceptance(1.0, 1.0) > metropolis_acceptance(2.0, 1.0));
    }

    // Tests that the inverse calibration reproduces the requested probability
    #[test]
    fn test_temperature_for_acceptance() {
        let temperature = temperature_for_acceptance(-3.0, 0.25).expect("valid inputs");
        assert!((metropolis_acceptance(3.0, temperature) - 0.25).abs() < 1e-12);

        assert!(temperature_for_acceptance(0.0, 0.5).is_none());
        assert!(temperature_for_acceptance(1.0, 0.0).is_none());
        assert!(temperature_for_acceptance(1.0, 1.0).is_none());
    }

    // Tests weighted selection including zero weights
    // Verified by returning the first non-zero index unconditionally
    #[test]
    fn test_weighted_choice() {
        let mut rng = StdRng::seed_from_u64(9);

        for _ in 0..100 {
            assert_eq!(weighted_choice(&mut rng, &[0.0, 1.0, 0.0]), 1);
        }
        assert_eq!(weighted_choice(&mut rng, &[0.0, 0.0]), 0);
        assert_eq!(weighted_choice(&mut rng, &[]), 0);

        let picks = (0..2000)
            .filter(|_| weighted_choice(&mut rng, &[3.0, 1.0]) == 0)
            .count();
        assert!((1300..1700).contains(&picks), "expected about 1500 picks, got {picks}");
    }

    // Tests the Bernoulli trial at its extremes
    #[test]
    fn test_accept_with_probability() {
        let mut rng = StdRng::seed_from_u64(2);

        assert!((0..50).all(|_| accept_with_probability(&mut rng, 1.0)));
        assert!((0..50).all(|_| !accept_with_probability(&mut rng, 0.0)));
    }
}
