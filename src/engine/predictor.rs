use super::pattern_library::{build_index, PatternIndex};
use crate::domain::{PatternKey, TickValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Spread of the outcomes that followed a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRange {
    pub min: TickValue,
    pub max: TickValue,
    /// Most frequent outcome; ties go to the smallest value.
    pub most_common: TickValue,
}

/// Point estimate for the next tick, derived from one pattern entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub pattern: PatternKey,
    /// `avg_next` rounded to the nearest integer.
    pub prediction: TickValue,
    /// Entry confidence rounded to the nearest integer, 0..=100.
    pub confidence: u32,
    /// Number of prior occurrences of the pattern.
    pub occurrences: usize,
    pub next_values: Vec<TickValue>,
    pub range: OutcomeRange,
}

impl Prediction {
    /// Whether the prediction clears a user confidence threshold.
    pub fn qualifies(&self, threshold: f64) -> bool {
        self.confidence as f64 >= threshold
    }
}

/// Look up the trailing window of `sequence` in `index`.
///
/// Returns `None` when the sequence is shorter than the window or the window
/// has never been followed by anything before.
pub fn predict(
    index: &PatternIndex,
    sequence: &[TickValue],
    pattern_length: usize,
) -> Option<Prediction> {
    if pattern_length == 0 || sequence.len() < pattern_length {
        return None;
    }
    let window = &sequence[sequence.len() - pattern_length..];
    let entry = index.get(window)?;

    let min = *entry.next_values.iter().min()?;
    let max = *entry.next_values.iter().max()?;
    let most_common = most_common(&entry.next_values)?;

    Some(Prediction {
        pattern: entry.pattern.clone(),
        prediction: entry.avg_next.round() as TickValue,
        confidence: entry.confidence.round() as u32,
        occurrences: entry.occurrences.len(),
        next_values: entry.next_values.clone(),
        range: OutcomeRange {
            min,
            max,
            most_common,
        },
    })
}

/// Build the index and predict in one step.
pub fn predict_next(sequence: &[TickValue], pattern_length: usize) -> Option<Prediction> {
    let index = build_index(sequence, pattern_length);
    predict(&index, sequence, pattern_length)
}

/// Frequency mode of `values`, smallest value on ties.
pub fn most_common(values: &[TickValue]) -> Option<TickValue> {
    let mut counts: BTreeMap<TickValue, usize> = BTreeMap::new();
    for &v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    // BTreeMap iterates ascending; keep the first value reaching the max count.
    let mut best: Option<(TickValue, usize)> = None;
    for (value, count) in counts {
        match best {
            Some((_, c)) if c >= count => {}
            _ => best = Some((value, count)),
        }
    }
    best.map(|(v, _)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_prediction_for_unseen_window() {
        // [5,5,20] never appeared before the end
        assert!(predict_next(&[5, 5, 5, 10, 5, 5, 5, 20], 3).is_none());
    }

    #[test]
    fn test_no_prediction_when_too_short() {
        assert!(predict_next(&[1, 2], 3).is_none());
        assert!(predict_next(&[], 1).is_none());
    }

    #[test]
    fn test_no_prediction_for_exact_length() {
        // N == L: nothing indexed yet
        assert!(predict_next(&[4, 4, 4], 3).is_none());
    }

    #[test]
    fn test_single_prior_occurrence() {
        let p = predict_next(&[1, 2, 3, 9, 1, 2, 3], 3).unwrap();
        assert_eq!(p.pattern, PatternKey(vec![1, 2, 3]));
        assert_eq!(p.prediction, 9);
        assert_eq!(p.confidence, 100);
        assert_eq!(p.occurrences, 1);
        assert_eq!(p.next_values, vec![9]);
        assert_eq!(p.range, OutcomeRange { min: 9, max: 9, most_common: 9 });
    }

    #[test]
    fn test_two_occurrences_rounding() {
        // [5,5,5] -> 10 and 20, trailing window [5,5,5] again
        let p = predict_next(&[5, 5, 5, 10, 5, 5, 5, 20, 5, 5, 5], 3).unwrap();
        assert_eq!(p.prediction, 15);
        assert_eq!(p.confidence, 67);
        assert_eq!(p.occurrences, 2);
        assert_eq!(p.range.min, 10);
        assert_eq!(p.range.max, 20);
    }

    #[test]
    fn test_half_rounds_up() {
        // [7] -> 1 and 2, mean 1.5
        let p = predict_next(&[7, 1, 7, 2, 7], 1).unwrap();
        assert_eq!(p.prediction, 2);
    }

    #[test]
    fn test_all_zero_sequence() {
        let p = predict_next(&[0, 0, 0, 0], 2).unwrap();
        assert_eq!(p.prediction, 0);
        assert_eq!(p.confidence, 100);
        assert_eq!(p.occurrences, 2);
    }

    #[test]
    fn test_most_common_tie_smallest_wins() {
        assert_eq!(most_common(&[7, 3, 7, 3, 5]), Some(3));
        assert_eq!(most_common(&[9, 9, 1]), Some(9));
        assert_eq!(most_common(&[4]), Some(4));
        assert_eq!(most_common(&[]), None);
    }

    #[test]
    fn test_qualifies_threshold() {
        let p = predict_next(&[5, 5, 5, 10, 5, 5, 5, 20, 5, 5, 5], 3).unwrap();
        assert!(p.qualifies(67.0));
        assert!(p.qualifies(50.0));
        assert!(!p.qualifies(67.5));
    }

    #[test]
    fn test_predict_is_pure() {
        let seq = crate::domain::DEFAULT_SEED.to_vec();
        let index = build_index(&seq, 2);
        let a = predict(&index, &seq, 2);
        let b = predict(&index, &seq, 2);
        assert_eq!(a, b);
        assert_eq!(seq, crate::domain::DEFAULT_SEED.to_vec());
    }
}
