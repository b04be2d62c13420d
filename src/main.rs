use std::{
    fs::File,
    io::{self, BufReader},
    path::PathBuf,
};

use anyhow::{Context, Result, bail};
use crossbeam_channel::unbounded;
use gesture_tracker::{
    DeliveryMode, GestureTracker, HistoryStore, SessionId, StabilizerEvent, TrackerConfig,
    frame_channel, input::JsonLinesSource, start_source, start_tracker,
};

const USAGE: &str = "usage: gesture-tracker [--history PATH] [--session ID] [--export] [--latest] \
[--window N] [--votes N] [--no-hand N] [INPUT|-]";

struct Args {
    input: Option<PathBuf>,
    session: Option<String>,
    export: bool,
    config: TrackerConfig,
}

fn parse_args() -> Result<Args> {
    let mut config = TrackerConfig {
        delivery: DeliveryMode::Sequential,
        ..TrackerConfig::default()
    };
    let mut input = None;
    let mut session = None;
    let mut export = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .with_context(|| format!("{name} expects a value\n{USAGE}"))
        };
        match arg.as_str() {
            "--history" => config.history_path = Some(PathBuf::from(value("--history")?)),
            "--session" => session = Some(value("--session")?),
            "--export" => export = true,
            "--latest" => config.delivery = DeliveryMode::Latest,
            "--window" => config.stabilizer.window_size = value("--window")?.parse()?,
            "--votes" => config.stabilizer.vote_threshold = value("--votes")?.parse()?,
            "--no-hand" => config.stabilizer.no_hand_threshold = value("--no-hand")?.parse()?,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            "-" => input = None,
            flag if flag.starts_with("--") => bail!("unknown flag {flag}\n{USAGE}"),
            path => input = Some(PathBuf::from(path)),
        }
    }

    config.stabilizer = config.stabilizer.sanitized();
    Ok(Args {
        input,
        session,
        export,
        config,
    })
}

fn main() -> Result<()> {
    env_logger::init();

    let args = parse_args()?;
    let config = args.config;

    let session = args
        .session
        .map(SessionId::from_string)
        .unwrap_or_default();
    let mut tracker = GestureTracker::with_session(&config, session);
    if let Some(path) = &config.history_path {
        let store = HistoryStore::load(path, config.history_capacity)
            .with_context(|| format!("failed to load history from {}", path.display()))?;
        tracker = tracker.with_store(store);
    }

    let (frame_tx, frame_rx) = frame_channel(config.delivery);
    let (_control_tx, control_rx) = unbounded();
    let (analysis_tx, analysis_rx) = unbounded();

    let worker = start_tracker(tracker, config.delivery, frame_rx, control_rx, analysis_tx);
    let source = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            start_source(JsonLinesSource::new(BufReader::new(file)), frame_tx)
        }
        None => start_source(JsonLinesSource::new(BufReader::new(io::stdin())), frame_tx),
    };

    for analysis in analysis_rx.iter() {
        for event in &analysis.events {
            match event {
                StabilizerEvent::Locked(gesture) => {
                    println!("[frame {}] {}", analysis.frame_number, gesture.display_text())
                }
                StabilizerEvent::Cleared { hand } => {
                    println!("[frame {}] {hand} hand cleared", analysis.frame_number)
                }
            }
        }
    }

    let frames = source.join().context("landmark source failed")?;
    let tracker = worker
        .join()
        .map_err(|_| anyhow::anyhow!("tracker thread panicked"))?;

    let stats = tracker.aggregator().stats();
    let metrics = tracker.aggregator().metrics();
    println!(
        "{} frames read, {} processed, {} gestures (avg confidence {:.0}%)",
        frames,
        metrics.frames_processed,
        stats.total_gestures,
        stats.average_confidence * 100.0
    );
    let mut counts: Vec<_> = stats.gestures_by_type.iter().collect();
    counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
    for (kind, count) in counts {
        println!("  {}{}: {count}", kind.emoji(), kind.display_name());
    }

    if let Some(store) = tracker.finish() {
        if let Some(path) = &config.history_path {
            store
                .save(path)
                .with_context(|| format!("failed to save history to {}", path.display()))?;
        }
        if args.export {
            println!("{}", store.export_json()?);
        }
    } else if args.export {
        log::warn!("--export needs --history to have anything to export");
    }

    Ok(())
}
