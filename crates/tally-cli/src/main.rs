//! tally - command-line front end for the poll lifecycle engine
//!
//! - `decide`: one pure engine pass over a snapshot file
//! - `run`: seed an in-memory store from a scenario and reconcile it

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tally_core::app::{AppBuilder, ReconcilerConfig, reconcile_pass};
use tally_core::domain::{
    Decider, EngineConfig, LifecycleDecider, PollId, PollSnapshot, Roster, VoterId,
};
use tally_core::impls::{InMemoryPollStore, LogNotifier};
use tally_core::ports::{Clock, FixedClock, IdGenerator, SystemClock, UlidGenerator};

mod scenario;

use scenario::Scenario;

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Poll lifecycle engine: reminders, quorum and deadline closing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the decision engine once and print the decision as JSON
    Decide {
        /// Poll snapshot (JSON)
        #[arg(long)]
        snapshot: PathBuf,

        /// Eligible voter; repeat for each roster member
        #[arg(long = "voter")]
        voters: Vec<String>,

        /// Treat the roster lookup as failed
        #[arg(long, conflicts_with = "voters")]
        roster_unavailable: bool,

        /// Evaluation time (RFC 3339). Defaults to now.
        #[arg(long)]
        now: Option<DateTime<Utc>>,

        /// Minimum seconds between reminder rounds
        #[arg(long, default_value_t = 900)]
        window_secs: u64,
    },

    /// Seed an in-memory store from a scenario file and reconcile it
    Run {
        /// Scenario (JSON)
        #[arg(long)]
        scenario: PathBuf,

        /// Reconciler config (JSON). Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Simulate this many passes on a virtual clock instead of running live
        #[arg(long)]
        ticks: Option<u32>,

        /// Virtual seconds between two simulated passes
        #[arg(long, default_value_t = 300)]
        tick_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Decide {
            snapshot,
            voters,
            roster_unavailable,
            now,
            window_secs,
        } => decide(snapshot, voters, roster_unavailable, now, window_secs),
        Commands::Run {
            scenario,
            config,
            ticks,
            tick_secs,
        } => run(scenario, config, ticks, tick_secs).await,
    }
}

fn decide(
    path: PathBuf,
    voters: Vec<String>,
    roster_unavailable: bool,
    now: Option<DateTime<Utc>>,
    window_secs: u64,
) -> Result<()> {
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let snapshot: PollSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;

    let roster = if roster_unavailable {
        Roster::Unavailable
    } else {
        Roster::resolved(voters.into_iter().map(VoterId::new))
    };
    let engine = LifecycleDecider::new(EngineConfig {
        notify_window: Duration::from_secs(window_secs),
    });
    let decision = engine.decide(&snapshot, now.unwrap_or_else(Utc::now), &roster);

    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

async fn run(
    scenario_path: PathBuf,
    config_path: Option<PathBuf>,
    ticks: Option<u32>,
    tick_secs: u64,
) -> Result<()> {
    let scenario = Scenario::load(&scenario_path)?;
    let config = match config_path {
        Some(path) => ReconcilerConfig::from_json_file(&path)?,
        None => ReconcilerConfig::default(),
    };

    let fixed = Arc::new(FixedClock::new(scenario.start.unwrap_or_else(Utc::now)));
    let clock: Arc<dyn Clock> = match ticks {
        Some(_) => fixed.clone(),
        None => Arc::new(SystemClock),
    };

    let store = Arc::new(InMemoryPollStore::new());
    let ids = UlidGenerator::new(Arc::clone(&clock));
    let mut polls: Vec<PollId> = Vec::with_capacity(scenario.polls.len());
    for poll in &scenario.polls {
        let id = ids.generate_poll_id();
        store
            .insert(PollSnapshot::open(id, clock.now(), poll.spec()))
            .await;
        tracing::info!(poll_id = %id, title = %poll.title, "poll opened");
        polls.push(id);
    }

    let app = AppBuilder::new()
        .store(store.clone())
        .roster(Arc::new(scenario.roster()))
        .notifier(Arc::new(LogNotifier))
        .clock(Arc::clone(&clock))
        .config(config)
        .build()?;

    match ticks {
        Some(ticks) => {
            for tick in 0..ticks {
                cast_votes(&app, &scenario, &polls, Some(tick)).await;
                let summary = reconcile_pass(&app.reconciler).await?;
                tracing::info!(
                    tick,
                    at = %clock.now(),
                    reminders = summary.reminders_sent(),
                    finalized = summary.finalized(),
                    failed = summary.failed.len(),
                    "tick"
                );
                fixed.advance(chrono::Duration::seconds(
                    i64::try_from(tick_secs).context("tick_secs too large")?,
                ));
            }
        }
        None => {
            cast_votes(&app, &scenario, &polls, None).await;
            let handle = app.spawn_loop();
            tracing::info!("reconcile loop running, press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            handle.shutdown_and_join().await;
        }
    }

    println!("{}", serde_json::to_string_pretty(&store.snapshots().await)?);
    Ok(())
}

/// Cast the scenario votes due at `tick` (all of them when `tick` is `None`).
async fn cast_votes(
    app: &tally_core::app::App,
    scenario: &Scenario,
    polls: &[PollId],
    tick: Option<u32>,
) {
    for (poll, &id) in scenario.polls.iter().zip(polls) {
        for vote in &poll.votes {
            if tick.is_some_and(|t| t != vote.at_tick) {
                continue;
            }
            if let Err(e) = app
                .ballot_box
                .cast(id, vote.voter.clone(), vote.choice)
                .await
            {
                tracing::warn!(poll_id = %id, voter = %vote.voter, error = %e, "vote rejected");
            }
        }
    }
}
