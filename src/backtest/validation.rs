use super::engine::replay;
use crate::domain::{EngineConfig, TickValue};

/// Outcome of comparing a replay against replays of shuffled copies.
#[derive(Debug, Clone)]
pub struct PermutationResult {
    /// Success rate (%) on the sequence as observed.
    pub actual_success_rate: f64,
    /// Mean success rate (%) across shuffled sequences.
    pub mean_shuffled_rate: f64,
    /// Fraction of shuffles doing at least as well as the real order.
    pub p_value: f64,
    pub is_significant: bool,
    /// Percentile of the real rate within the shuffled distribution.
    pub percentile: f64,
}

impl PermutationResult {
    pub fn print_summary(&self) {
        println!("\n--- Shuffle Test ---");
        println!("  Actual success rate:   {:>8.1}%", self.actual_success_rate);
        println!("  Shuffled mean rate:    {:>8.1}%", self.mean_shuffled_rate);
        println!("  p-value:               {:>8.3}", self.p_value);
        println!("  Percentile:            {:>8.1}", self.percentile);
        println!(
            "  Verdict:               {}",
            if self.is_significant {
                "ordering carries signal (p < 0.05)"
            } else {
                "indistinguishable from shuffled history"
            }
        );
    }
}

/// Monte Carlo permutation test: does the order of the ticks matter?
///
/// Shuffling keeps the value distribution and destroys any sequential
/// structure, so a pattern matcher on noise should score about the same.
pub fn permutation_test(
    sequence: &[TickValue],
    config: &EngineConfig,
    warmup: usize,
    n_permutations: usize,
    seed: u64,
) -> PermutationResult {
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    let actual_success_rate = replay(sequence, config, warmup).summary.success_rate;

    if n_permutations == 0 || sequence.len() <= warmup {
        return PermutationResult {
            actual_success_rate,
            mean_shuffled_rate: 0.0,
            p_value: 1.0,
            is_significant: false,
            percentile: 50.0,
        };
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut shuffled_rates = Vec::with_capacity(n_permutations);
    for _ in 0..n_permutations {
        let mut shuffled = sequence.to_vec();
        shuffled.shuffle(&mut rng);
        shuffled_rates.push(replay(&shuffled, config, warmup).summary.success_rate);
    }

    let mean_shuffled_rate = shuffled_rates.iter().sum::<f64>() / n_permutations as f64;
    let better_count = shuffled_rates
        .iter()
        .filter(|&&r| r >= actual_success_rate)
        .count();
    let p_value = better_count as f64 / n_permutations as f64;
    let rank = shuffled_rates
        .iter()
        .filter(|&&r| r < actual_success_rate)
        .count();
    let percentile = rank as f64 / n_permutations as f64 * 100.0;

    PermutationResult {
        actual_success_rate,
        mean_shuffled_rate,
        p_value,
        is_significant: p_value < 0.05,
        percentile,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic_sequence_beats_shuffles() {
        let seq: Vec<TickValue> = (0..60).map(|i| [2, 9, 4, 17, 30][i % 5]).collect();
        let cfg = EngineConfig {
            pattern_length: 2,
            ..Default::default()
        };
        let result = permutation_test(&seq, &cfg, 10, 50, 42);
        assert_eq!(result.actual_success_rate, 100.0);
        assert!(result.mean_shuffled_rate < 100.0);
        assert!(result.is_significant, "p={}", result.p_value);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let cfg = EngineConfig::default();
        let seq = crate::domain::DEFAULT_SEED;
        let a = permutation_test(&seq, &cfg, 20, 10, 7);
        let b = permutation_test(&seq, &cfg, 20, 10, 7);
        assert_eq!(a.p_value, b.p_value);
        assert_eq!(a.mean_shuffled_rate, b.mean_shuffled_rate);
    }

    #[test]
    fn test_zero_permutations() {
        let result = permutation_test(&[1, 2, 3, 4], &EngineConfig::default(), 2, 0, 1);
        assert_eq!(result.p_value, 1.0);
        assert!(!result.is_significant);
    }

    #[test]
    fn test_p_value_in_unit_interval() {
        let cfg = EngineConfig {
            pattern_length: 1,
            confidence_threshold: 0.0,
        };
        let r = permutation_test(&crate::domain::DEFAULT_SEED, &cfg, 10, 20, 3);
        assert!((0.0..=1.0).contains(&r.p_value));
        assert!((0.0..=100.0).contains(&r.percentile));
    }
}
