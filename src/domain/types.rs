use crate::errors::TickError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// A single observed tick count. Non-negative by construction.
pub type TickValue = u32;

/// Seed sequence used when nothing has been stored yet.
pub const DEFAULT_SEED: [TickValue; 100] = [
    13, 56, 4, 21, 8, 13, 83, 3, 21, 15, 39, 1, 3, 5, 6, 19, 11, 114, 11, 3, 19, 10, 47, 4, 7, 8,
    24, 9, 14, 21, 43, 37, 11, 31, 20, 18, 3, 18, 0, 7, 17, 2, 0, 3, 17, 13, 23, 8, 16, 25, 76,
    11, 66, 51, 1, 32, 1, 7, 5, 17, 41, 26, 28, 6, 10, 1, 49, 9, 21, 1, 71, 3, 21, 22, 7, 10, 22,
    20, 5, 1, 47, 26, 10, 21, 23, 1, 52, 8, 30, 24, 4, 19, 49, 8, 5, 8, 4, 3, 29, 17,
];

/// Fixed-length window of tick values used as a lookup key.
/// Two windows with identical values in identical order are the same pattern.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatternKey(pub Vec<TickValue>);

impl PatternKey {
    pub fn from_slice(window: &[TickValue]) -> Self {
        Self(window.to_vec())
    }
}

// Vec<T> and [T] hash identically, so map lookups by slice are sound.
impl Borrow<[TickValue]> for PatternKey {
    fn borrow(&self) -> &[TickValue] {
        &self.0
    }
}

impl std::fmt::Display for PatternKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", joined.join(","))
    }
}

/// Engine settings chosen by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Window length L used for pattern keys (observed range 2..=5).
    pub pattern_length: usize,
    /// Minimum confidence (0..=100) for a prediction to count.
    pub confidence_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pattern_length: 3,
            confidence_threshold: 50.0,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), TickError> {
        if self.pattern_length == 0 {
            return Err(TickError::ZeroPatternLength);
        }
        if !(0.0..=100.0).contains(&self.confidence_threshold) {
            return Err(TickError::ThresholdOutOfRange(self.confidence_threshold));
        }
        Ok(())
    }
}

/// Parse user-entered text into a tick value.
///
/// Rejects empty input, negatives, fractions and anything non-numeric, so
/// only well-formed values ever reach the sequence.
pub fn parse_tick(input: &str) -> Result<TickValue, TickError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TickError::Empty);
    }
    match trimmed.parse::<i64>() {
        Ok(v) if v < 0 => Err(TickError::Negative(trimmed.to_string())),
        Ok(v) => TickValue::try_from(v).map_err(|_| TickError::NotNumeric(trimmed.to_string())),
        Err(_) => Err(TickError::NotNumeric(trimmed.to_string())),
    }
}
