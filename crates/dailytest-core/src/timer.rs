//! Cancellable one-second repeat used by the session countdown.
//!
//! The session never sleeps itself. A [`TickSource`] delivers ticks to
//! whoever drives the session, and the session's [`Ticker`] decides when to
//! stop them. Stopping is idempotent everywhere.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Default remaining seconds below which the countdown is flagged as running low.
pub const LOW_TIME_SECS: u32 = 300;

/// Identifies one scheduled repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// Something that can deliver periodic ticks for a timer id.
pub trait TickSource: Send {
    /// Begin delivering ticks for `id` every `period`.
    fn start(&mut self, id: TimerId, period: Duration);

    /// Stop delivering ticks for `id`. Unknown or already stopped ids are
    /// ignored.
    fn stop(&mut self, id: TimerId);
}

/// Owns at most one active repeat on a tick source.
pub struct Ticker {
    source: Box<dyn TickSource>,
    active: Option<TimerId>,
    next_id: u64,
}

impl Ticker {
    pub fn new(source: Box<dyn TickSource>) -> Self {
        Self {
            source,
            active: None,
            next_id: 1,
        }
    }

    /// Schedule a new repeat, cancelling any previous one first.
    pub fn start(&mut self, period: Duration) -> TimerId {
        self.cancel();
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.source.start(id, period);
        self.active = Some(id);
        id
    }

    /// Stop the active repeat. Returns `false` if nothing was running.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(id) => {
                self.source.stop(id);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<TimerId> {
        self.active
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Tick source backed by `tokio::time::interval`.
///
/// Each repeat runs in its own task and sends its id on the channel once per
/// period. The first tick is sent one full period after `start`.
pub struct TokioTickSource {
    tx: mpsc::UnboundedSender<TimerId>,
    tasks: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioTickSource {
    /// Create a source and the receiver its ticks arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TimerId>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                tasks: HashMap::new(),
            },
            rx,
        )
    }
}

impl TickSource for TokioTickSource {
    fn start(&mut self, id: TimerId, period: Duration) {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                interval.tick().await;
                if tx.send(id).is_err() {
                    break;
                }
            }
        });
        if let Some(previous) = self.tasks.insert(id, handle) {
            previous.abort();
        }
    }

    fn stop(&mut self, id: TimerId) {
        if let Some(handle) = self.tasks.remove(&id) {
            handle.abort();
            tracing::trace!(timer = id.as_u64(), "tick task aborted");
        }
    }
}

impl Drop for TokioTickSource {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

/// A call recorded by [`ManualTickSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickCall {
    Start(TimerId, Duration),
    Stop(TimerId),
}

/// Tick source that only records calls. Tests deliver ticks by hand.
#[derive(Clone, Default)]
pub struct ManualTickSource {
    calls: Arc<Mutex<Vec<TickCall>>>,
}

impl ManualTickSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<TickCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn stop_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, TickCall::Stop(_)))
            .count()
    }

    fn record(&self, call: TickCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl TickSource for ManualTickSource {
    fn start(&mut self, id: TimerId, period: Duration) {
        self.record(TickCall::Start(id, period));
    }

    fn stop(&mut self, id: TimerId) {
        self.record(TickCall::Stop(id));
    }
}

/// Countdown display, e.g. `59:07`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Elapsed-time display, e.g. `12m 5s`.
pub fn format_duration(seconds: u64) -> String {
    format!("{}m {}s", seconds / 60, seconds % 60)
}
