use crate::domain::{EngineConfig, TickValue};
use crate::engine::session::{PredictionStatus, TickSession};
use crate::evaluation::metrics::HistorySummary;
use crate::evaluation::scorer::PredictionOutcome;

/// Result of walking a sequence forward one tick at a time.
#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub outcomes: Vec<PredictionOutcome>,
    pub summary: HistorySummary,
    /// Ticks appended after the warmup prefix.
    pub replayed: usize,
    /// Appends where the trailing window had never been seen.
    pub no_match: usize,
    /// Appends where a prediction existed but missed the threshold.
    pub below_threshold: usize,
}

impl ReplayResult {
    pub fn empty() -> Self {
        Self {
            outcomes: Vec::new(),
            summary: HistorySummary::from_outcomes(&[]),
            replayed: 0,
            no_match: 0,
            below_threshold: 0,
        }
    }

    /// Share of replayed ticks that produced a scored prediction, in percent.
    pub fn coverage_pct(&self) -> f64 {
        if self.replayed == 0 {
            return 0.0;
        }
        self.outcomes.len() as f64 / self.replayed as f64 * 100.0
    }

    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(50));
        println!("  REPLAY RESULTS");
        println!("{}", "=".repeat(50));
        println!("  Ticks Replayed:     {:>10}", self.replayed);
        println!("  No Pattern Match:   {:>10}", self.no_match);
        println!("  Below Threshold:    {:>10}", self.below_threshold);
        println!("  Scored:             {:>10}", self.outcomes.len());
        println!("  Coverage:           {:>9.1}%", self.coverage_pct());
        self.summary.print_summary();
    }
}

/// Replay `sequence` through a fresh session.
///
/// The first `warmup` ticks seed the session; every later tick goes through
/// the same append path as live input, so each outcome is scored against a
/// prediction made only from earlier ticks.
pub fn replay(sequence: &[TickValue], config: &EngineConfig, warmup: usize) -> ReplayResult {
    if sequence.len() <= warmup {
        return ReplayResult::empty();
    }

    let mut session = TickSession::new(sequence[..warmup].to_vec(), config.clone());
    let mut no_match = 0;
    let mut below_threshold = 0;

    for &value in &sequence[warmup..] {
        match session.analyze().status(config.confidence_threshold) {
            PredictionStatus::NoMatch => no_match += 1,
            PredictionStatus::BelowThreshold => below_threshold += 1,
            PredictionStatus::Ready => {}
        }
        session.append(value);
    }

    let outcomes = session.history().to_vec();
    tracing::info!(
        replayed = sequence.len() - warmup,
        scored = outcomes.len(),
        "replay finished"
    );
    ReplayResult {
        summary: HistorySummary::from_outcomes(&outcomes),
        outcomes,
        replayed: sequence.len() - warmup,
        no_match,
        below_threshold,
    }
}
