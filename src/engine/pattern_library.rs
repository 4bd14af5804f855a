use crate::domain::{PatternKey, TickValue};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::HashMap;

// ── Pattern entries ────────────────────────────────────────────────────────────

/// Aggregated outcomes for one distinct pattern within one index build.
///
/// `occurrences` and `next_values` are parallel: the i-th start index was
/// followed by the i-th next value. Both are in discovery (ascending) order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub pattern: PatternKey,
    pub occurrences: Vec<usize>,
    pub next_values: Vec<TickValue>,
    /// Arithmetic mean of `next_values`.
    pub avg_next: f64,
    /// Inverse coefficient of variation, clamped to [0, 100].
    pub confidence: f64,
}

impl PatternEntry {
    fn new(pattern: PatternKey) -> Self {
        Self {
            pattern,
            occurrences: Vec::new(),
            next_values: Vec::new(),
            avg_next: 0.0,
            confidence: 0.0,
        }
    }

    fn record(&mut self, start: usize, next: TickValue) {
        self.occurrences.push(start);
        self.next_values.push(next);
    }

    fn finalize(&mut self) {
        if self.next_values.is_empty() {
            return;
        }
        self.avg_next = mean(&self.next_values);
        self.confidence = confidence_score(&self.next_values, self.avg_next);
    }

    /// How many times a prediction for this pattern could have been validated.
    pub fn sample_count(&self) -> usize {
        self.next_values.len()
    }
}

/// Arithmetic mean of tick values; 0 for an empty slice.
pub fn mean(values: &[TickValue]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: u64 = values.iter().map(|&v| v as u64).sum();
    sum as f64 / values.len() as f64
}

/// `max(0, 100 - stdDev / mean * 100)` with population standard deviation.
///
/// A zero mean is replaced by 1 in the denominator. With non-negative ticks a
/// zero mean implies every value is zero, so the guard always yields 100.
pub fn confidence_score(values: &[TickValue], avg: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let as_f64: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    let std_dev = as_f64.iter().population_std_dev();
    let denom = if avg == 0.0 { 1.0 } else { avg };
    (100.0 - (std_dev / denom) * 100.0).max(0.0)
}

// ── Index ──────────────────────────────────────────────────────────────────────

/// Immutable map from pattern key to its aggregated outcomes.
///
/// Built fresh from a sequence snapshot; never updated in place. Entries are
/// kept in order of first occurrence so iteration is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternIndex {
    pattern_length: usize,
    total_points: usize,
    entries: Vec<PatternEntry>,
    lookup: HashMap<PatternKey, usize>,
}

/// Summary counts shown alongside the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub unique_patterns: usize,
    /// Patterns seen at least twice.
    pub recurring_patterns: usize,
    pub total_points: usize,
    pub pattern_length: usize,
}

impl PatternIndex {
    fn empty(pattern_length: usize, total_points: usize) -> Self {
        Self {
            pattern_length,
            total_points,
            entries: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    pub fn pattern_length(&self) -> usize {
        self.pattern_length
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, window: &[TickValue]) -> Option<&PatternEntry> {
        self.lookup.get(window).map(|&pos| &self.entries[pos])
    }

    /// Entries in order of first occurrence.
    pub fn entries(&self) -> &[PatternEntry] {
        &self.entries
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            unique_patterns: self.entries.len(),
            recurring_patterns: self
                .entries
                .iter()
                .filter(|e| e.sample_count() >= 2)
                .count(),
            total_points: self.total_points,
            pattern_length: self.pattern_length,
        }
    }
}

/// Scan every overlapping window of `pattern_length` and record the value
/// that followed it.
///
/// Windows start at 0..=N-L-1; the trailing L values never become a key
/// because nothing follows them yet. Returns an empty index when N <= L.
pub fn build_index(sequence: &[TickValue], pattern_length: usize) -> PatternIndex {
    let n = sequence.len();
    let mut index = PatternIndex::empty(pattern_length, n);
    if pattern_length == 0 || n <= pattern_length {
        return index;
    }

    for start in 0..(n - pattern_length) {
        let window = &sequence[start..start + pattern_length];
        let next = sequence[start + pattern_length];
        let pos = match index.lookup.get(window) {
            Some(&pos) => pos,
            None => {
                let key = PatternKey::from_slice(window);
                index.entries.push(PatternEntry::new(key.clone()));
                let pos = index.entries.len() - 1;
                index.lookup.insert(key, pos);
                pos
            }
        };
        index.entries[pos].record(start, next);
    }

    for entry in &mut index.entries {
        entry.finalize();
    }

    tracing::debug!(
        points = n,
        pattern_length,
        unique = index.entries.len(),
        "built pattern index"
    );
    index
}

// ── Tests ──────────────────────────────────────────────────────────────────────
