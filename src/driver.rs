//! Periodic tick source bound to a session
//!
//! A `Ticker` is a background timer that emits one token per period. It is
//! a scoped resource: dropping it stops and joins the timer thread, so no
//! ticks arrive after it is gone. A `Driver` owns a session and at most one
//! ticker; starting a run always tears down the previous ticker first.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::consts::MAX_SUBSTEPS;
use crate::sim::{GameEvent, Session, TickInput, tick};

/// A cancellable periodic timer
pub struct Ticker {
    rx: Receiver<u64>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawn the timer thread; `live` counts timer threads still running
    pub fn start(period: Duration, live: Arc<AtomicUsize>) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        live.fetch_add(1, Ordering::SeqCst);
        let thread_live = Arc::clone(&live);
        let spawned = thread::Builder::new()
            .name("ticker".into())
            .spawn(move || {
                let mut seq = 0u64;
                let mut next = Instant::now() + period;
                while !flag.load(Ordering::Acquire) {
                    let now = Instant::now();
                    if now < next {
                        thread::park_timeout(next - now);
                        continue;
                    }
                    seq += 1;
                    if tx.send(seq).is_err() {
                        break;
                    }
                    next = next_deadline(next, period, now);
                }
                thread_live.fetch_sub(1, Ordering::SeqCst);
            });

        match spawned {
            Ok(handle) => Ok(Self {
                rx,
                stop,
                handle: Some(handle),
            }),
            Err(e) => {
                live.fetch_sub(1, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// Number of ticks that have fired since the last drain
    pub fn drain(&self) -> u32 {
        self.rx.try_iter().count() as u32
    }

    /// Block until the next tick fires; false on timeout or if the timer died
    pub fn wait(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(_) => true,
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("Ticker thread exited unexpectedly");
                false
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                log::warn!("Ticker thread panicked");
            }
        }
    }
}

/// Deadline after a tick that was due at `due` and fired at `now`
///
/// After a stall the schedule restarts one period from now, so a late
/// timer never fires twice in a row.
fn next_deadline(due: Instant, period: Duration, now: Instant) -> Instant {
    let next = due + period;
    if next <= now { now + period } else { next }
}

/// Ticks applied by a single pump; any excess backlog is dropped
fn catch_up(due: u32) -> u32 {
    if due > MAX_SUBSTEPS {
        log::warn!(
            "Tick source fell behind, dropping {} ticks",
            due - MAX_SUBSTEPS
        );
        MAX_SUBSTEPS
    } else {
        due
    }
}

/// Owns a session and the single tick source feeding it
pub struct Driver {
    session: Session,
    ticker: Option<Ticker>,
    live: Arc<AtomicUsize>,
}

impl Driver {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            ticker: None,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Stop ticking and hand the session back
    pub fn into_session(mut self) -> Session {
        self.stop();
        self.session
    }

    /// Start a fresh run: stop any prior ticker, reset the round, start ticking
    pub fn start(&mut self) -> std::io::Result<()> {
        self.stop();
        self.session.reset();
        let period = self.session.config().tick_period();
        self.ticker = Some(Ticker::start(period, Arc::clone(&self.live))?);
        log::info!("Tick source started ({:?} period)", period);
        Ok(())
    }

    /// Stop ticking; the session keeps its state
    pub fn stop(&mut self) {
        if self.ticker.take().is_some() {
            log::info!("Tick source stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Timer threads currently alive for this driver (0 or 1)
    pub fn live_sources(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Flap now; ignored once the round has ended
    pub fn flap(&mut self) -> bool {
        self.session.flap()
    }

    /// Apply the ticks that have fired since the last pump, at most
    /// `MAX_SUBSTEPS` of them
    pub fn pump(&mut self) -> Vec<GameEvent> {
        let due = self.ticker.as_ref().map_or(0, Ticker::drain);
        self.apply(catch_up(due))
    }

    /// Block for the next tick (up to `timeout`), then apply it and any backlog
    /// up to `MAX_SUBSTEPS` ticks
    pub fn pump_blocking(&mut self, timeout: Duration) -> Vec<GameEvent> {
        let Some(ticker) = self.ticker.as_ref() else {
            log::warn!("pump_blocking called with no tick source");
            return Vec::new();
        };
        if !ticker.wait(timeout) {
            return Vec::new();
        }
        let due = 1 + ticker.drain();
        self.apply(catch_up(due))
    }

    fn apply(&mut self, due: u32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let input = TickInput::default();
        for _ in 0..due {
            events.extend(tick(&mut self.session, &input));
            if self.session.is_terminal() {
                // The round is over; release the timer until the next start
                self.stop();
                break;
            }
        }
        events
    }
}
