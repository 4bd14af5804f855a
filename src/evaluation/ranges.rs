use crate::domain::TickValue;
use crate::engine::predictor::Prediction;
use serde::{Deserialize, Serialize};

/// A named value range with its empirical probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeBin {
    pub name: String,
    pub min: TickValue,
    /// `None` means unbounded above.
    pub max: Option<TickValue>,
    pub count: usize,
    /// Percentage 0..=100, one decimal.
    pub probability: f64,
    pub recommended: bool,
}

impl RangeBin {
    fn new(name: &str, min: TickValue, max: Option<TickValue>) -> Self {
        Self {
            name: name.to_string(),
            min,
            max,
            count: 0,
            probability: 0.0,
            recommended: false,
        }
    }

    pub fn contains(&self, value: TickValue) -> bool {
        value >= self.min && self.max.map_or(true, |max| value <= max)
    }

    /// Number of integers covered, `None` when unbounded.
    pub fn width(&self) -> Option<TickValue> {
        self.max.map(|max| max - self.min + 1)
    }
}

/// Fixed bins over the raw tick domain. Exhaustive and disjoint.
const HISTORICAL_BINS: [(&str, TickValue, Option<TickValue>); 5] = [
    ("Very Low (0-5)", 0, Some(5)),
    ("Low (6-15)", 6, Some(15)),
    ("Medium (16-30)", 16, Some(30)),
    ("High (31-50)", 31, Some(50)),
    ("Very High (51+)", 51, None),
];

pub const EXACT_MATCH: &str = "Exact Match";
pub const CLOSE: &str = "Close (±1)";
pub const NEAR: &str = "Near (±3)";
pub const EXTENDED: &str = "Extended (±5)";

/// Round a percentage to one decimal place.
pub fn round1(pct: f64) -> f64 {
    (pct * 10.0).round() / 10.0
}

/// Count `values` into `bins`, fill probabilities, flag bins at or above
/// `threshold`, and sort by descending probability (stable on ties).
///
/// Every value is tested against every bin, so overlapping bins each count it.
fn classify(mut bins: Vec<RangeBin>, values: &[TickValue], threshold: f64) -> Vec<RangeBin> {
    for &v in values {
        for bin in bins.iter_mut() {
            if bin.contains(v) {
                bin.count += 1;
            }
        }
    }
    let total = values.len();
    for bin in bins.iter_mut() {
        bin.probability = if total > 0 {
            round1(bin.count as f64 / total as f64 * 100.0)
        } else {
            0.0
        };
        bin.recommended = bin.probability >= threshold;
    }
    bins.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    bins
}

/// Distribution of the whole sequence over the five fixed bins.
pub fn historical_ranges(sequence: &[TickValue], threshold: f64) -> Vec<RangeBin> {
    let bins = HISTORICAL_BINS
        .iter()
        .map(|&(name, min, max)| RangeBin::new(name, min, max))
        .collect();
    classify(bins, sequence, threshold)
}

/// The four prediction-relative bins, unsorted and uncounted, narrowest first.
pub fn predicted_bins(p: TickValue) -> Vec<RangeBin> {
    vec![
        RangeBin::new(EXACT_MATCH, p, Some(p)),
        RangeBin::new(CLOSE, p.saturating_sub(1), Some(p.saturating_add(1))),
        RangeBin::new(NEAR, p.saturating_sub(3), Some(p.saturating_add(3))),
        RangeBin::new(EXTENDED, p.saturating_sub(5), Some(p.saturating_add(5))),
    ]
}

/// Distribution of a prediction's outcomes around its point value.
///
/// The bins nest (±0 ⊂ ±1 ⊂ ±3 ⊂ ±5), so one outcome may count in several.
/// Empty unless the prediction clears `threshold`.
pub fn predicted_ranges(prediction: Option<&Prediction>, threshold: f64) -> Vec<RangeBin> {
    match prediction {
        Some(p) if p.qualifies(threshold) => {
            classify(predicted_bins(p.prediction), &p.next_values, threshold)
        }
        _ => Vec::new(),
    }
}
