use super::pattern_library::{build_index, PatternIndex};
use super::predictor::{predict, Prediction};
use crate::domain::{EngineConfig, TickValue};
use crate::errors::TickError;
use crate::evaluation::metrics::HistorySummary;
use crate::evaluation::ranges::{historical_ranges, predicted_ranges, RangeBin};
use crate::evaluation::scorer::{record_outcome, PredictionOutcome};

/// Everything derived from one snapshot of the sequence.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub index: PatternIndex,
    pub prediction: Option<Prediction>,
    pub historical_ranges: Vec<RangeBin>,
    pub predicted_ranges: Vec<RangeBin>,
}

/// How the current prediction should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionStatus {
    /// Trailing window never seen before (or not enough data).
    NoMatch,
    /// A prediction exists but its confidence is under the threshold.
    BelowThreshold,
    Ready,
}

impl Analysis {
    pub fn compute(sequence: &[TickValue], config: &EngineConfig) -> Self {
        let index = build_index(sequence, config.pattern_length);
        let prediction = predict(&index, sequence, config.pattern_length);
        let historical_ranges = historical_ranges(sequence, config.confidence_threshold);
        let predicted_ranges = predicted_ranges(prediction.as_ref(), config.confidence_threshold);
        Self {
            index,
            prediction,
            historical_ranges,
            predicted_ranges,
        }
    }

    pub fn status(&self, threshold: f64) -> PredictionStatus {
        match &self.prediction {
            None => PredictionStatus::NoMatch,
            Some(p) if p.qualifies(threshold) => PredictionStatus::Ready,
            Some(_) => PredictionStatus::BelowThreshold,
        }
    }
}

/// Owner of the live tick sequence.
///
/// All appends go through [`TickSession::append`], which scores the prediction
/// made from the pre-append snapshot before the new value lands. Analyses are
/// recomputed from scratch on every call; nothing is cached across appends.
#[derive(Debug, Clone)]
pub struct TickSession {
    ticks: Vec<TickValue>,
    loaded_len: usize,
    config: EngineConfig,
    history: Vec<PredictionOutcome>,
}

impl TickSession {
    pub fn new(ticks: Vec<TickValue>, config: EngineConfig) -> Self {
        Self {
            loaded_len: ticks.len(),
            ticks,
            config,
            history: Vec::new(),
        }
    }

    /// Attach previously stored outcomes (oldest first).
    pub fn with_history(mut self, history: Vec<PredictionOutcome>) -> Self {
        self.history = history;
        self
    }

    pub fn ticks(&self) -> &[TickValue] {
        &self.ticks
    }

    /// Ticks appended since the session was opened.
    pub fn user_added(&self) -> &[TickValue] {
        &self.ticks[self.loaded_len.min(self.ticks.len())..]
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Recorded outcomes, oldest first.
    pub fn history(&self) -> &[PredictionOutcome] {
        &self.history
    }

    pub fn summary(&self) -> HistorySummary {
        HistorySummary::from_outcomes(&self.history)
    }

    pub fn analyze(&self) -> Analysis {
        Analysis::compute(&self.ticks, &self.config)
    }

    /// Record the outcome of the standing prediction (if it qualifies), then
    /// append `value`. Returns the outcome record, if one was produced.
    pub fn append(&mut self, value: TickValue) -> Option<PredictionOutcome> {
        let analysis = self.analyze();
        let outcome = analysis.prediction.as_ref().and_then(|p| {
            let l = self.config.pattern_length;
            let window = &self.ticks[self.ticks.len() - l..];
            record_outcome(
                p,
                window,
                value,
                &analysis.predicted_ranges,
                self.config.confidence_threshold,
            )
        });

        if let Some(rec) = &outcome {
            tracing::debug!(
                predicted = rec.predicted_value,
                actual = rec.actual_value,
                correct = rec.is_correct,
                range = %rec.predicted_range,
                "recorded prediction outcome"
            );
            self.history.push(rec.clone());
        }
        self.ticks.push(value);
        outcome
    }

    pub fn set_pattern_length(&mut self, pattern_length: usize) -> Result<(), TickError> {
        let candidate = EngineConfig {
            pattern_length,
            ..self.config.clone()
        };
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }

    pub fn set_confidence_threshold(&mut self, threshold: f64) -> Result<(), TickError> {
        let candidate = EngineConfig {
            confidence_threshold: threshold,
            ..self.config.clone()
        };
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }

    /// Drop all ticks and history.
    pub fn reset(&mut self) {
        self.ticks.clear();
        self.history.clear();
        self.loaded_len = 0;
    }
}
