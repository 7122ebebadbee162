//! Acceptance probabilities and seeded weighted sampling

use rand::Rng;

/// Metropolis acceptance probability of a cost change at a temperature
///
/// Improvements and neutral moves are always accepted. A non-positive
/// temperature only accepts them.
pub fn metropolis_acceptance(delta: f64, temperature: f64) -> f64 {
    if delta <= 0.0 {
        return 1.0;
    }
    if temperature <= 0.0 {
        return 0.0;
    }
    (-delta / temperature).exp()
}

/// Temperature at which a cost change of `|delta|` is accepted with `probability`
///
/// Solves `probability = exp(-|delta| / T)` for `T`. Returns `None` when the
/// probability is outside `(0, 1)` or the delta is zero.
pub fn temperature_for_acceptance(delta: f64, probability: f64) -> Option<f64> {
    let magnitude = delta.abs();
    if magnitude == 0.0 || probability <= 0.0 || probability >= 1.0 {
        return None;
    }
    Some(-magnitude / probability.ln())
}

/// Generic weighted random selection
///
/// Returns index into weights array using cumulative distribution
pub fn weighted_choice<R: Rng + ?Sized>(rng: &mut R, weights: &[f64]) -> usize {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return 0;
    }

    let mut rand_val = rng.random::<f64>() * total;
    for (i, &weight) in weights.iter().enumerate() {
        rand_val -= weight;
        if rand_val <= 0.0 {
            return i;
        }
    }
    weights.len().saturating_sub(1)
}

/// Draw a Bernoulli trial with success probability `probability`
pub fn accept_with_probability<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    probability >= 1.0 || rng.random::<f64>() < probability
}
