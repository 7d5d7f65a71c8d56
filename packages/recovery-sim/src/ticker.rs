//! ticker.rs — Periodic tick source
//!
//! The store starts the ticker when a mission begins and stops it on end,
//! reset or abort. The ticker itself never touches mission state: it only
//! signals that a period elapsed, and whoever owns the receiving side calls
//! `MissionStore::tick()`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

pub trait Ticker: Send + Sync {
    /// Begin firing every `period`. Restarts with the new period if already running.
    fn start(&mut self, period: Duration);
    /// Stop firing. Calling this when already stopped is a no-op.
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

// ── Tokio interval ticker ─────────────────────────────────────────────────────

/// Ticker backed by a tokio interval task. Each period sends one `()` on the
/// channel returned from `new`; a full channel drops the tick instead of queueing.
pub struct IntervalTicker {
    handle: Handle,
    tx: mpsc::Sender<()>,
    task: Option<JoinHandle<()>>,
}

impl IntervalTicker {
    pub fn new(handle: Handle) -> (Self, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel(1);
        (Self { handle, tx, task: None }, rx)
    }
}

impl Ticker for IntervalTicker {
    fn start(&mut self, period: Duration) {
        self.stop();
        let tx = self.tx.clone();
        let period = period.max(Duration::from_millis(1));
        self.task = Some(self.handle.spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick completes immediately; a mission's first step lands one period in.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match tx.try_send(()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(())) => debug!("tick coalesced"),
                    Err(mpsc::error::TrySendError::Closed(())) => break,
                }
            }
        }));
        debug!("ticker started ({}ms)", period.as_millis());
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("ticker stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Manual ticker (tests) ─────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickerLog {
    pub starts: u32,
    pub stops: u32,
    pub running: bool,
    pub period: Option<Duration>,
}

/// Ticker that never fires on its own. Clones share one `TickerLog`, so a test
/// can keep a handle after moving the ticker into the store.
#[derive(Debug, Default, Clone)]
pub struct ManualTicker {
    log: Arc<Mutex<TickerLog>>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> TickerLog {
        *self.log.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Ticker for ManualTicker {
    fn start(&mut self, period: Duration) {
        let mut log = self.log.lock().unwrap_or_else(|p| p.into_inner());
        log.starts += 1;
        log.running = true;
        log.period = Some(period);
    }

    fn stop(&mut self) {
        let mut log = self.log.lock().unwrap_or_else(|p| p.into_inner());
        if log.running {
            log.stops += 1;
            log.running = false;
        }
    }

    fn is_running(&self) -> bool {
        self.log().running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_ticker_stop_is_idempotent() {
        let mut ticker = ManualTicker::new();
        let handle = ticker.clone();
        ticker.stop();
        assert_eq!(handle.log().stops, 0);

        ticker.start(Duration::from_millis(1000));
        assert!(handle.is_running());
        assert_eq!(handle.log().period, Some(Duration::from_millis(1000)));

        ticker.stop();
        ticker.stop();
        let log = handle.log();
        assert_eq!((log.starts, log.stops, log.running), (1, 1, false));
    }

    #[tokio::test]
    async fn test_interval_ticker_delivers_and_stops() {
        let (mut ticker, mut rx) = IntervalTicker::new(Handle::current());
        assert!(!ticker.is_running());

        ticker.start(Duration::from_millis(5));
        let got = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert_eq!(got.ok().flatten(), Some(()));
        assert!(ticker.is_running());

        ticker.stop();
        ticker.stop();
        assert!(!ticker.is_running());
    }
}
