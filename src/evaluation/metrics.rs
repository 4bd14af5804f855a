use super::ranges::round1;
use super::scorer::PredictionOutcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hit-rate summary over recorded prediction outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total_predictions: usize,
    pub correct_predictions: usize,
    /// Percent correct, one decimal; 0 when there is no history.
    pub success_rate: f64,
    /// Percent incorrect, one decimal; 0 when there is no history.
    pub fail_rate: f64,
    /// How often the actual value landed in each named predicted range.
    pub range_hits: BTreeMap<String, usize>,
}

impl HistorySummary {
    pub fn from_outcomes(outcomes: &[PredictionOutcome]) -> Self {
        let total = outcomes.len();
        let correct = outcomes.iter().filter(|o| o.is_correct).count();
        let (success_rate, fail_rate) = if total > 0 {
            (
                round1(correct as f64 / total as f64 * 100.0),
                round1((total - correct) as f64 / total as f64 * 100.0),
            )
        } else {
            (0.0, 0.0)
        };

        let mut range_hits = BTreeMap::new();
        for o in outcomes {
            *range_hits.entry(o.predicted_range.clone()).or_insert(0) += 1;
        }

        Self {
            total_predictions: total,
            correct_predictions: correct,
            success_rate,
            fail_rate,
            range_hits,
        }
    }

    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(50));
        println!("  PREDICTION PERFORMANCE");
        println!("{}", "=".repeat(50));
        println!("  Total Predictions:  {:>10}", self.total_predictions);
        println!("  Correct:            {:>10}", self.correct_predictions);
        println!("  Success Rate:       {:>9.1}%", self.success_rate);
        println!("  Fail Rate:          {:>9.1}%", self.fail_rate);
        if !self.range_hits.is_empty() {
            println!("  Actual value landed in:");
            for (name, hits) in &self.range_hits {
                println!("    {:18} {:>8}", name, hits);
            }
        }
        println!("{}", "=".repeat(50));
    }
}
