use clap::Parser;
use serde::Serialize;
use tickpat::data::{CsvStore, TickEvent};
use tickpat::domain::{parse_tick, EngineConfig};
use tickpat::engine::{Analysis, IndexStats, Prediction, PredictionStatus, TickSession};
use tickpat::evaluation::RangeBin;

#[derive(Parser)]
#[command(name = "tickpat", about = "Pattern-matching next-tick estimator")]
struct Cli {
    /// Directory holding ticks.csv and history.csv
    #[arg(long, global = true, default_value = "data")]
    data_dir: String,
    /// Pattern length (window size)
    #[arg(short, long, global = true, default_value = "3")]
    pattern_length: usize,
    /// Minimum confidence (0-100) for a prediction to count
    #[arg(short, long, global = true, default_value = "50")]
    confidence: f64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show pattern statistics, the current prediction and range tables
    Predict {
        #[arg(long)]
        json: bool,
    },
    /// Add a manually observed tick
    Add { value: String },
    /// Show prediction history and performance
    History,
    /// Delete all stored ticks and prediction history
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// Run the simulated tick feed through the append path
    Feed {
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
        #[arg(short, long, default_value = "5000")]
        interval_ms: u64,
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
    /// Replay the stored sequence and score every prediction
    Replay {
        #[arg(short, long, default_value = "20")]
        warmup: usize,
        /// Shuffled replays for the significance test (0 to skip)
        #[arg(long, default_value = "200")]
        permutations: usize,
    },
}

#[derive(Serialize)]
struct PredictReport<'a> {
    stats: IndexStats,
    status: &'static str,
    prediction: Option<&'a Prediction>,
    historical_ranges: &'a [RangeBin],
    predicted_ranges: &'a [RangeBin],
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = EngineConfig {
        pattern_length: cli.pattern_length,
        confidence_threshold: cli.confidence,
    };
    config.validate()?;
    let mut store = CsvStore::new(&cli.data_dir);

    match cli.command {
        Commands::Predict { json } => {
            let session = TickSession::new(store.load_or_seed()?, config);
            run_predict(&session, json)?;
        }
        Commands::Add { value } => {
            let value = parse_tick(&value)?;
            let mut session = open_session(&mut store, config)?;
            match tickpat::data::apply_tick(&mut session, &mut store, TickEvent::manual(value)) {
                Some(rec) => println!(
                    "Predicted {} ({}%), actual {}: {} [{}]",
                    rec.predicted_value,
                    rec.confidence,
                    rec.actual_value,
                    if rec.is_correct { "Correct" } else { "Incorrect" },
                    rec.predicted_range
                ),
                None => println!("Added {} (no qualifying prediction to score)", value),
            }
            println!(
                "Total data points: {} ({} added this session)",
                session.ticks().len(),
                session.user_added().len()
            );
        }
        Commands::History => {
            let history = store.load_history()?;
            run_history(&history);
        }
        Commands::Reset { yes } => {
            if !yes {
                println!("This deletes ALL tick data and prediction history. Re-run with --yes.");
                return Ok(());
            }
            let stored = store.load_ticks()?.into_iter().map(|t| t.value).collect();
            let mut session =
                TickSession::new(stored, config).with_history(store.load_history()?);
            let (ticks, outcomes) = (session.ticks().len(), session.history().len());
            store.clear()?;
            session.reset();
            println!(
                "Deleted {} ticks and {} prediction records. Data points now: {}",
                ticks,
                outcomes,
                session.ticks().len()
            );
        }
        Commands::Feed {
            count,
            interval_ms,
            seed,
        } => {
            let mut session = open_session(&mut store, config)?;
            let (tx, rx) = tokio::sync::mpsc::channel(64);
            let feed = tickpat::data::spawn_simulated_feed(
                tx,
                std::time::Duration::from_millis(interval_ms),
                count,
                seed,
            );
            println!("Streaming {} simulated ticks every {}ms...", count, interval_ms);
            let outcomes = tickpat::data::ingest(rx, &mut session, &mut store).await;
            let sent = feed.await?;
            println!(
                "Appended {} ticks, scored {} predictions ({} points added this session)",
                sent,
                outcomes.len(),
                session.user_added().len()
            );
            tickpat::evaluation::HistorySummary::from_outcomes(&outcomes).print_summary();
        }
        Commands::Replay {
            warmup,
            permutations,
        } => {
            let ticks = store.load_or_seed()?;
            println!(
                "Replaying {} ticks (warmup {}, pattern length {}, min confidence {}%)",
                ticks.len(),
                warmup,
                config.pattern_length,
                config.confidence_threshold
            );
            let result = tickpat::backtest::replay(&ticks, &config, warmup);
            result.print_summary();
            if permutations > 0 && !result.outcomes.is_empty() {
                tickpat::backtest::permutation_test(&ticks, &config, warmup, permutations, 42)
                    .print_summary();
            }
        }
    }

    Ok(())
}

fn open_session(
    store: &mut CsvStore,
    config: EngineConfig,
) -> Result<TickSession, Box<dyn std::error::Error>> {
    let ticks = store.seed_if_empty()?;
    let history = store.load_history()?;
    Ok(TickSession::new(ticks, config).with_history(history))
}

fn status_label(status: PredictionStatus) -> &'static str {
    match status {
        PredictionStatus::NoMatch => "no_match",
        PredictionStatus::BelowThreshold => "below_threshold",
        PredictionStatus::Ready => "ready",
    }
}

fn run_predict(session: &TickSession, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let threshold = session.config().confidence_threshold;
    let analysis: Analysis = session.analyze();
    let status = analysis.status(threshold);

    if json {
        let report = PredictReport {
            stats: analysis.index.stats(),
            status: status_label(status),
            prediction: analysis.prediction.as_ref(),
            historical_ranges: &analysis.historical_ranges,
            predicted_ranges: &analysis.predicted_ranges,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let stats = analysis.index.stats();
    println!("=== Pattern Statistics ===");
    println!("  Unique Patterns Found: {:>6}", stats.unique_patterns);
    println!("  Recurring Patterns:    {:>6}", stats.recurring_patterns);
    println!("  Total Data Points:     {:>6}", stats.total_points);
    println!("  Pattern Length:        {:>6}", stats.pattern_length);

    println!("\n=== Live Prediction ===");
    match (status, analysis.prediction.as_ref()) {
        (PredictionStatus::Ready, Some(p)) => {
            println!("  Current pattern:   {}", p.pattern);
            println!("  Next value:        {}", p.prediction);
            println!("  Confidence:        {}%", p.confidence);
            println!("  Seen before:       {} times", p.occurrences);
            println!(
                "  Range:             min {} / max {} / most common {}",
                p.range.min, p.range.max, p.range.most_common
            );
            let outcomes: Vec<String> = p.next_values.iter().map(|v| v.to_string()).collect();
            println!("  Historical outcomes: {}", outcomes.join(", "));
            print_ranges("Predicted Ranges", &analysis.predicted_ranges);
        }
        (PredictionStatus::BelowThreshold, Some(p)) => {
            println!("  Prediction Confidence Too Low");
            println!(
                "  The current pattern has a confidence of {}%, below your minimum of {}%.",
                p.confidence, threshold
            );
        }
        _ => {
            println!("  No Pattern Match Found");
            println!(
                "  The last {} ticks have not been seen before in the dataset.",
                session.config().pattern_length
            );
        }
    }

    print_ranges("Historical Ranges", &analysis.historical_ranges);
    Ok(())
}

fn print_ranges(title: &str, ranges: &[RangeBin]) {
    println!("\n=== {} ===", title);
    println!("  {:18} {:>6} {:>8} {:>12}", "Range", "Count", "Prob%", "Recommended");
    for r in ranges {
        println!(
            "  {:18} {:>6} {:>7.1}% {:>12}",
            r.name,
            r.count,
            r.probability,
            if r.recommended { "yes" } else { "" }
        );
    }
}

fn run_history(history: &[tickpat::evaluation::PredictionOutcome]) {
    if history.is_empty() {
        println!("No prediction history yet. Add new ticks to see performance.");
        return;
    }
    println!(
        "  {:25} {:12} {:>6} {:>6} {:>5} {:10} {}",
        "Timestamp", "Pattern", "Pred", "Actual", "Conf", "Result", "Range"
    );
    for rec in history.iter().rev() {
        println!(
            "  {:25} {:12} {:>6} {:>6} {:>4}% {:10} {}",
            rec.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            rec.pattern,
            rec.predicted_value,
            rec.actual_value,
            rec.confidence,
            if rec.is_correct { "Correct" } else { "Incorrect" },
            rec.predicted_range
        );
    }
    tickpat::evaluation::HistorySummary::from_outcomes(history).print_summary();
}
