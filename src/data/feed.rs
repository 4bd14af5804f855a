use super::cache::TickSink;
use crate::domain::TickValue;
use crate::engine::session::TickSession;
use crate::evaluation::scorer::PredictionOutcome;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Largest value the simulated feed emits.
pub const FEED_MAX_VALUE: TickValue = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSource {
    Manual,
    Feed,
}

/// A newly observed value waiting to be appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent {
    pub value: TickValue,
    pub source: TickSource,
}

impl TickEvent {
    pub fn manual(value: TickValue) -> Self {
        Self {
            value,
            source: TickSource::Manual,
        }
    }
}

/// Emit `count` uniform random ticks in 0..=99, one per `interval`.
///
/// Stops early if the receiver is dropped. Resolves to the number sent.
pub fn spawn_simulated_feed(
    tx: mpsc::Sender<TickEvent>,
    interval: Duration,
    count: usize,
    seed: u64,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut sent = 0;
        for _ in 0..count {
            tokio::time::sleep(interval).await;
            let value = rng.gen_range(0..=FEED_MAX_VALUE);
            let event = TickEvent {
                value,
                source: TickSource::Feed,
            };
            if tx.send(event).await.is_err() {
                tracing::info!(sent, "feed receiver closed, stopping simulation");
                break;
            }
            tracing::debug!(value, "emitted simulated tick");
            sent += 1;
        }
        sent
    })
}

/// The single append path for every tick, whatever its source.
///
/// Scores the standing prediction, persists the outcome and then the tick,
/// and advances the session. Persistence failures are logged and never stop
/// the in-memory append.
pub fn apply_tick<S: TickSink>(
    session: &mut TickSession,
    sink: &mut S,
    event: TickEvent,
) -> Option<PredictionOutcome> {
    let outcome = session.append(event.value);

    if let Some(rec) = &outcome {
        if let Err(e) = sink.append_outcome(rec) {
            tracing::warn!(error = %e, "failed to persist prediction outcome");
        }
    }
    if let Err(e) = sink.append_tick(event.value) {
        tracing::warn!(error = %e, value = event.value, "failed to persist tick");
    }

    tracing::info!(
        value = event.value,
        source = ?event.source,
        total = session.ticks().len(),
        scored = outcome.is_some(),
        "tick appended"
    );
    outcome
}

/// Drain `rx` until every sender is gone, applying ticks one at a time.
pub async fn ingest<S: TickSink>(
    mut rx: mpsc::Receiver<TickEvent>,
    session: &mut TickSession,
    sink: &mut S,
) -> Vec<PredictionOutcome> {
    let mut outcomes = Vec::new();
    while let Some(event) = rx.recv().await {
        if let Some(rec) = apply_tick(session, sink, event) {
            outcomes.push(rec);
        }
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EngineConfig;

    #[derive(Default)]
    struct MemorySink {
        ticks: Vec<TickValue>,
        outcomes: Vec<PredictionOutcome>,
    }

    impl TickSink for MemorySink {
        fn append_tick(&mut self, value: TickValue) -> Result<(), Box<dyn std::error::Error>> {
            self.ticks.push(value);
            Ok(())
        }

        fn append_outcome(
            &mut self,
            outcome: &PredictionOutcome,
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.outcomes.push(outcome.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl TickSink for FailingSink {
        fn append_tick(&mut self, _value: TickValue) -> Result<(), Box<dyn std::error::Error>> {
            Err("disk full".into())
        }

        fn append_outcome(
            &mut self,
            _outcome: &PredictionOutcome,
        ) -> Result<(), Box<dyn std::error::Error>> {
            Err("disk full".into())
        }
    }

    fn zero_session() -> TickSession {
        let cfg = EngineConfig {
            pattern_length: 2,
            ..Default::default()
        };
        TickSession::new(vec![0, 0, 0, 0], cfg)
    }

    #[test]
    fn test_apply_tick_persists_outcome_and_tick() {
        let mut session = zero_session();
        let mut sink = MemorySink::default();
        let rec = apply_tick(&mut session, &mut sink, TickEvent::manual(0)).unwrap();
        assert!(rec.is_correct);
        assert_eq!(sink.ticks, vec![0]);
        assert_eq!(sink.outcomes, vec![rec]);
        assert_eq!(session.ticks().len(), 5);
    }

    #[test]
    fn test_persistence_failure_does_not_block_append() {
        let mut session = zero_session();
        let rec = apply_tick(&mut session, &mut FailingSink, TickEvent::manual(3));
        assert!(rec.is_some());
        assert_eq!(session.ticks(), &[0, 0, 0, 0, 3]);
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn test_simulated_feed_range_and_count() {
        let (tx, mut rx) = mpsc::channel(16);
        let handle = spawn_simulated_feed(tx, Duration::from_millis(1), 20, 7);
        let mut values = Vec::new();
        while let Some(ev) = rx.recv().await {
            assert_eq!(ev.source, TickSource::Feed);
            values.push(ev.value);
        }
        assert_eq!(handle.await.unwrap(), 20);
        assert_eq!(values.len(), 20);
        assert!(values.iter().all(|&v| v <= FEED_MAX_VALUE));
    }

    #[tokio::test]
    async fn test_feed_is_seeded() {
        let collect = |seed| async move {
            let (tx, mut rx) = mpsc::channel(16);
            spawn_simulated_feed(tx, Duration::from_millis(1), 10, seed);
            let mut out = Vec::new();
            while let Some(ev) = rx.recv().await {
                out.push(ev.value);
            }
            out
        };
        assert_eq!(collect(42).await, collect(42).await);
    }

    #[tokio::test]
    async fn test_ingest_merges_manual_and_feed() {
        let (tx, rx) = mpsc::channel(16);
        let feed = spawn_simulated_feed(tx.clone(), Duration::from_millis(1), 5, 1);
        tx.send(TickEvent::manual(0)).await.unwrap();
        drop(tx);

        let mut session = zero_session();
        let mut sink = MemorySink::default();
        let outcomes = ingest(rx, &mut session, &mut sink).await;

        assert_eq!(feed.await.unwrap(), 5);
        // every value appended exactly once
        assert_eq!(session.ticks().len(), 4 + 6);
        assert_eq!(sink.ticks.len(), 6);
        assert_eq!(outcomes.len(), sink.outcomes.len());
        assert_eq!(outcomes.len(), session.history().len());
    }

    #[tokio::test]
    async fn test_feed_stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = spawn_simulated_feed(tx, Duration::from_millis(1), 50, 3);
        assert_eq!(handle.await.unwrap(), 0);
    }
}
