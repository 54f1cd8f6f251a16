//! Flappy Whale headless runner
//!
//! Drives a session from its tick source with the autopilot flapping, and
//! logs each round. Rendering is left to whatever consumes the snapshots.

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;

use flappy_whale::autopilot::Autopilot;
use flappy_whale::sim::{FixedStep, GameEvent, TickInput, tick};
use flappy_whale::{Driver, Session, SimConfig};

/// Simulated frame time for `--fast` runs (60 fps)
const FAST_FRAME: Duration = Duration::from_micros(16_667);

#[derive(Parser)]
#[command(author, version, about = "Flappy Whale headless runner", long_about = None)]
struct Args {
    // JSON config file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    // RNG seed; derived from the clock when omitted
    #[arg(short, long)]
    seed: Option<u64>,

    // Number of rounds to play
    #[arg(short, long, default_value_t = 1)]
    rounds: u32,

    // Give up on a round after this many ticks
    #[arg(long, default_value_t = 3000)]
    max_ticks: u64,

    // Simulate time with the fixed-step clock instead of waiting on the ticker
    #[arg(long, default_value_t = false)]
    fast: bool,

    // Print the final snapshot of each round as JSON
    #[arg(long, default_value_t = false)]
    snapshot: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SimConfig::default(),
    };
    let seed = args.seed.unwrap_or_else(clock_seed);
    log::info!("Flappy Whale starting (seed {})", seed);

    let session = Session::new(config, seed).context("building session")?;
    let pilot = Autopilot::default();

    let session = if args.fast {
        run_fast(session, &pilot, &args)?
    } else {
        run_realtime(session, &pilot, &args)?
    };

    log::info!("Best score: {}", session.best);
    Ok(())
}

/// Wall-clock run: ticks come from the driver's timer thread
fn run_realtime(session: Session, pilot: &Autopilot, args: &Args) -> Result<Session> {
    let timeout = session.config().tick_period() * 10;
    let mut driver = Driver::new(session);

    for round in 1..=args.rounds {
        driver.start().context("starting tick source")?;
        while driver.is_running() && driver.session().time_ticks < args.max_ticks {
            if pilot.decide(driver.session()) {
                driver.flap();
            }
            for event in driver.pump_blocking(timeout) {
                log_event(&event);
            }
        }
        driver.stop();
        finish_round(round, driver.session(), args.snapshot)?;
    }
    Ok(driver.into_session())
}

/// Simulated run: a fixed-step clock fed with constant frame times
fn run_fast(mut session: Session, pilot: &Autopilot, args: &Args) -> Result<Session> {
    let mut clock = FixedStep::new(session.config().tick_period());

    for round in 1..=args.rounds {
        if round > 1 {
            tick(
                &mut session,
                &TickInput {
                    reset: true,
                    ..Default::default()
                },
            );
            clock.clear();
        }
        while !session.is_terminal() && session.time_ticks < args.max_ticks {
            for _ in 0..clock.advance(FAST_FRAME) {
                let input = TickInput {
                    flap: pilot.decide(&session),
                    ..Default::default()
                };
                for event in tick(&mut session, &input) {
                    log_event(&event);
                }
            }
        }
        finish_round(round, &session, args.snapshot)?;
    }
    Ok(session)
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::Scored { score, .. } => log::info!("Score: {}", score),
        GameEvent::Terminal { cause, score } => {
            log::info!("Round over ({}) with score {}", cause, score)
        }
        other => log::debug!("{:?}", other),
    }
}

fn finish_round(round: u32, session: &Session, print_snapshot: bool) -> Result<()> {
    if !session.is_terminal() {
        log::warn!(
            "Round {} stopped after {} ticks without ending",
            round,
            session.time_ticks
        );
    }
    log::info!(
        "Round {}: score {} in {} ticks",
        round,
        session.score,
        session.time_ticks
    );
    if print_snapshot {
        println!("{}", serde_json::to_string(&session.snapshot())?);
    }
    Ok(())
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(42)
}
