use super::ranges::RangeBin;
use crate::domain::{PatternKey, TickValue};
use crate::engine::predictor::Prediction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel for an actual value outside every predicted bin.
pub const NO_RANGE: &str = "None";

/// Immutable record of how a qualifying prediction fared against the next tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionOutcome {
    pub predicted_value: TickValue,
    pub actual_value: TickValue,
    pub is_correct: bool,
    /// Comma-joined window the prediction was made from.
    pub pattern: String,
    pub confidence: u32,
    /// Name of the narrowest predicted bin holding the actual value, or "None".
    pub predicted_range: String,
    pub timestamp: DateTime<Utc>,
}

/// Narrowest bin containing `actual`. Unbounded bins rank last.
///
/// The predicted bins nest, so list order alone would make the answer depend
/// on how the caller sorted them.
pub fn matching_range<'a>(ranges: &'a [RangeBin], actual: TickValue) -> Option<&'a RangeBin> {
    ranges
        .iter()
        .filter(|b| b.contains(actual))
        .min_by_key(|b| b.width().unwrap_or(TickValue::MAX))
}

/// Score the prediction made before `actual` was observed.
///
/// Returns `None` when the prediction does not clear `threshold`; callers
/// only record outcomes for predictions that were shown as actionable.
pub fn record_outcome(
    prediction: &Prediction,
    window: &[TickValue],
    actual: TickValue,
    ranges: &[RangeBin],
    threshold: f64,
) -> Option<PredictionOutcome> {
    if !prediction.qualifies(threshold) {
        return None;
    }
    let predicted_range = matching_range(ranges, actual)
        .map(|b| b.name.clone())
        .unwrap_or_else(|| NO_RANGE.to_string());

    Some(PredictionOutcome {
        predicted_value: prediction.prediction,
        actual_value: actual,
        is_correct: actual == prediction.prediction,
        pattern: PatternKey::from_slice(window).to_string(),
        confidence: prediction.confidence,
        predicted_range,
        timestamp: Utc::now(),
    })
}
