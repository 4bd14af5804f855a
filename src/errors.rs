use thiserror::Error;

/// Input and configuration errors raised before anything reaches the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TickError {
    #[error("tick value is empty")]
    Empty,
    #[error("tick value is not a whole number: {0}")]
    NotNumeric(String),
    #[error("tick value must be non-negative, got {0}")]
    Negative(String),
    #[error("pattern length must be at least 1")]
    ZeroPatternLength,
    #[error("confidence threshold must be within 0..=100, got {0}")]
    ThresholdOutOfRange(f64),
}
