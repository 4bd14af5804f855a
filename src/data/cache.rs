use crate::domain::{TickValue, DEFAULT_SEED};
use crate::evaluation::scorer::PredictionOutcome;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Persistence seam for the append path.
///
/// Implementations may fail; the ingest loop logs failures and keeps going.
pub trait TickSink {
    fn append_tick(&mut self, value: TickValue) -> Result<(), Box<dyn std::error::Error>>;
    fn append_outcome(
        &mut self,
        outcome: &PredictionOutcome,
    ) -> Result<(), Box<dyn std::error::Error>>;
}

/// Stored tick with the time it was saved.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTick {
    pub timestamp: DateTime<Utc>,
    pub value: TickValue,
}

const TICKS_HEADER: [&str; 2] = ["timestamp", "value"];
const HISTORY_HEADER: [&str; 7] = [
    "timestamp",
    "predicted_value",
    "actual_value",
    "is_correct",
    "pattern",
    "confidence",
    "predicted_range",
];

/// CSV files under one data directory: `ticks.csv` and `history.csv`.
#[derive(Debug, Clone)]
pub struct CsvStore {
    data_dir: PathBuf,
}

impl CsvStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn ticks_path(&self) -> PathBuf {
        self.data_dir.join("ticks.csv")
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("history.csv")
    }

    /// Load stored ticks, oldest first. A missing file means nothing stored.
    /// Rows are stably sorted by timestamp.
    pub fn load_ticks(&self) -> Result<Vec<StoredTick>, Box<dyn std::error::Error>> {
        let path = self.ticks_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path)?;
        let mut ticks = Vec::new();
        for result in reader.records() {
            let record = result?;
            ticks.push(StoredTick {
                timestamp: record[0].parse()?,
                value: record[1].parse()?,
            });
        }
        sort_chronological(&mut ticks, |t| t.timestamp, &path);
        Ok(ticks)
    }

    /// Stored tick values, or the default seed when nothing is stored.
    pub fn load_or_seed(&self) -> Result<Vec<TickValue>, Box<dyn std::error::Error>> {
        let ticks = self.load_ticks()?;
        if ticks.is_empty() {
            tracing::info!(
                seed_len = DEFAULT_SEED.len(),
                "no stored ticks, starting from default seed"
            );
            return Ok(DEFAULT_SEED.to_vec());
        }
        tracing::info!(count = ticks.len(), path = %self.ticks_path().display(), "loaded ticks");
        Ok(ticks.into_iter().map(|t| t.value).collect())
    }

    /// Like [`CsvStore::load_or_seed`], but writes the seed out first so later
    /// appends extend it instead of replacing it.
    pub fn seed_if_empty(&mut self) -> Result<Vec<TickValue>, Box<dyn std::error::Error>> {
        let ticks = self.load_ticks()?;
        if !ticks.is_empty() {
            return Ok(ticks.into_iter().map(|t| t.value).collect());
        }
        let path = self.ticks_path();
        let mut writer = self.appender(&path, &TICKS_HEADER)?;
        let now = Utc::now().to_rfc3339();
        for v in DEFAULT_SEED {
            writer.write_record(&[now.clone(), v.to_string()])?;
        }
        writer.flush()?;
        tracing::info!(path = %path.display(), "wrote default seed");
        Ok(DEFAULT_SEED.to_vec())
    }

    /// Load stored outcome records, oldest first.
    pub fn load_history(&self) -> Result<Vec<PredictionOutcome>, Box<dyn std::error::Error>> {
        let path = self.history_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path)?;
        let mut history = Vec::new();
        for result in reader.records() {
            let record = result?;
            history.push(PredictionOutcome {
                timestamp: record[0].parse()?,
                predicted_value: record[1].parse()?,
                actual_value: record[2].parse()?,
                is_correct: record[3].parse()?,
                pattern: record[4].to_string(),
                confidence: record[5].parse()?,
                predicted_range: record[6].to_string(),
            });
        }
        sort_chronological(&mut history, |o| o.timestamp, &path);
        Ok(history)
    }

    /// Delete both files. Missing files are fine.
    pub fn clear(&self) -> Result<(), Box<dyn std::error::Error>> {
        for path in [self.ticks_path(), self.history_path()] {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::info!(path = %path.display(), "removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn appender(
        &self,
        path: &Path,
        header: &[&str],
    ) -> Result<csv::Writer<std::fs::File>, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(&self.data_dir)?;
        let fresh = !path.exists() || std::fs::metadata(path)?.len() == 0;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if fresh {
            writer.write_record(header)?;
        }
        Ok(writer)
    }
}

impl TickSink for CsvStore {
    fn append_tick(&mut self, value: TickValue) -> Result<(), Box<dyn std::error::Error>> {
        let path = self.ticks_path();
        let mut writer = self.appender(&path, &TICKS_HEADER)?;
        writer.write_record(&[Utc::now().to_rfc3339(), value.to_string()])?;
        writer.flush()?;
        Ok(())
    }

    fn append_outcome(
        &mut self,
        outcome: &PredictionOutcome,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let path = self.history_path();
        let mut writer = self.appender(&path, &HISTORY_HEADER)?;
        writer.write_record(&[
            outcome.timestamp.to_rfc3339(),
            outcome.predicted_value.to_string(),
            outcome.actual_value.to_string(),
            outcome.is_correct.to_string(),
            outcome.pattern.clone(),
            outcome.confidence.to_string(),
            outcome.predicted_range.clone(),
        ])?;
        writer.flush()?;
        Ok(())
    }
}

/// Stable sort by timestamp. Rows written across a wall-clock step back end up
/// out of order; they are reordered, never rejected.
fn sort_chronological<T>(
    rows: &mut [T],
    timestamp: impl Fn(&T) -> DateTime<Utc>,
    path: &Path,
) {
    if rows.windows(2).all(|w| timestamp(&w[0]) <= timestamp(&w[1])) {
        return;
    }
    tracing::warn!(path = %path.display(), "timestamps out of order, sorting on load");
    rows.sort_by_key(|r| timestamp(r));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_outcome(predicted: TickValue, actual: TickValue) -> PredictionOutcome {
        PredictionOutcome {
            predicted_value: predicted,
            actual_value: actual,
            is_correct: predicted == actual,
            pattern: "5,5,5".into(),
            confidence: 67,
            predicted_range: "Close (±1)".into(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_ticks_append_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::new(dir.path());
        for v in [3, 0, 114] {
            store.append_tick(v).unwrap();
        }
        let loaded = store.load_ticks().unwrap();
        let values: Vec<TickValue> = loaded.iter().map(|t| t.value).collect();
        assert_eq!(values, vec![3, 0, 114]);
    }

    #[test]
    fn test_missing_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path().join("nested"));
        assert!(store.load_ticks().unwrap().is_empty());
        assert!(store.load_history().unwrap().is_empty());
    }

    #[test]
    fn test_load_or_seed_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::new(dir.path());
        assert_eq!(store.load_or_seed().unwrap(), DEFAULT_SEED.to_vec());
        store.append_tick(7).unwrap();
        assert_eq!(store.load_or_seed().unwrap(), vec![7]);
    }

    #[test]
    fn test_seed_if_empty_persists_seed() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::new(dir.path());
        assert_eq!(store.seed_if_empty().unwrap(), DEFAULT_SEED.to_vec());
        store.append_tick(5).unwrap();
        let values = store.seed_if_empty().unwrap();
        assert_eq!(values.len(), DEFAULT_SEED.len() + 1);
        assert_eq!(*values.last().unwrap(), 5);
    }

    #[test]
    fn test_history_preserves_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::new(dir.path());
        let first = make_outcome(15, 16);
        let second = make_outcome(15, 15);
        store.append_outcome(&first).unwrap();
        store.append_outcome(&second).unwrap();

        let loaded = store.load_history().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], first);
        assert_eq!(loaded[1], second);
        assert_eq!(loaded[0].predicted_range, "Close (±1)");
        assert_eq!(loaded[0].pattern, "5,5,5");
    }

    #[test]
    fn test_clear_removes_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::new(dir.path());
        store.append_tick(1).unwrap();
        store.append_outcome(&make_outcome(1, 1)).unwrap();
        store.clear().unwrap();
        assert!(!store.ticks_path().exists());
        assert!(!store.history_path().exists());
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_ticks_sorted_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path());
        std::fs::write(
            store.ticks_path(),
            "timestamp,value\n\
             2026-01-01T00:00:05Z,1\n\
             2026-01-01T00:00:03Z,2\n\
             2026-01-01T00:00:05Z,3\n",
        )
        .unwrap();
        let loaded = store.load_ticks().unwrap();
        let values: Vec<TickValue> = loaded.iter().map(|t| t.value).collect();
        assert_eq!(values, vec![2, 1, 3]);
        assert_eq!(store.load_or_seed().unwrap(), vec![2, 1, 3]);
    }

    #[test]
    fn test_history_sorted_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::new(dir.path());
        let mut later = make_outcome(15, 16);
        later.timestamp = "2026-01-01T00:00:05Z".parse().unwrap();
        let mut earlier = make_outcome(15, 15);
        earlier.timestamp = "2026-01-01T00:00:03Z".parse().unwrap();
        store.append_outcome(&later).unwrap();
        store.append_outcome(&earlier).unwrap();

        let loaded = store.load_history().unwrap();
        assert_eq!(loaded, vec![earlier, later]);
    }

    #[test]
    fn test_empty_existing_file_gets_header() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::new(dir.path());
        std::fs::write(store.ticks_path(), "").unwrap();
        store.append_tick(7).unwrap();
        store.append_tick(8).unwrap();
        let loaded = store.load_ticks().unwrap();
        let values: Vec<TickValue> = loaded.iter().map(|t| t.value).collect();
        assert_eq!(values, vec![7, 8]);

        std::fs::write(store.history_path(), "").unwrap();
        store.append_outcome(&make_outcome(1, 1)).unwrap();
        assert_eq!(store.load_history().unwrap().len(), 1);
    }

    #[test]
    fn test_negative_value_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path());
        std::fs::write(store.ticks_path(), "timestamp,value\n2026-01-01T00:00:00Z,-4\n").unwrap();
        assert!(store.load_ticks().is_err());
    }

    #[test]
    fn test_path_layout() {
        let store = CsvStore::new("/data");
        assert_eq!(store.ticks_path(), PathBuf::from("/data/ticks.csv"));
        assert_eq!(store.history_path(), PathBuf::from("/data/history.csv"));
    }
}
