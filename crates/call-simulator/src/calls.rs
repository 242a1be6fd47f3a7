//! Session-local call activity feed and its scripted demo call.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::timing::SimulationTiming;

/// Entries kept in the feed.
pub const MAX_ACTIVITY: usize = 10;

/// Message of the entry every fresh feed starts with.
pub const SYSTEM_READY: &str = "System initialized – Ready to receive calls";

const TIME_LABEL: &str = "Just now";

/// What a feed entry reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    Incoming,
    Answered,
    Ended,
}

impl CallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallKind::Incoming => "incoming",
            CallKind::Answered => "answered",
            CallKind::Ended => "ended",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallActivityEntry {
    pub id: u64,
    pub message: String,
    pub time_label: String,
    pub kind: CallKind,
}

/// Counters shown above the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallMetrics {
    pub current_calls: u32,
    pub total_calls_today: u32,
    pub missed_calls: u32,
    /// `M:SS`.
    pub avg_duration: String,
}

impl Default for CallMetrics {
    fn default() -> Self {
        Self {
            current_calls: 0,
            total_calls_today: 0,
            missed_calls: 0,
            avg_duration: "0:00".to_string(),
        }
    }
}

/// Feed entries (newest first) plus the metrics.
#[derive(Debug, Clone, Serialize)]
pub struct CallFeed {
    pub entries: VecDeque<CallActivityEntry>,
    pub metrics: CallMetrics,
    #[serde(skip)]
    next_id: u64,
}

impl Default for CallFeed {
    fn default() -> Self {
        let mut entries = VecDeque::with_capacity(MAX_ACTIVITY);
        entries.push_front(CallActivityEntry {
            id: 1,
            message: SYSTEM_READY.to_string(),
            time_label: TIME_LABEL.to_string(),
            kind: CallKind::Answered,
        });
        Self {
            entries,
            metrics: CallMetrics::default(),
            next_id: 2,
        }
    }
}

impl CallFeed {
    /// Prepend an entry, dropping the oldest past [`MAX_ACTIVITY`].
    pub fn push(&mut self, kind: CallKind, message: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_front(CallActivityEntry {
            id,
            message: message.into(),
            time_label: TIME_LABEL.to_string(),
            kind,
        });
        self.entries.truncate(MAX_ACTIVITY);
        id
    }
}

/// Masked caller number: `+91 NNNNN XXXXX`.
fn caller_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("+91 {} XXXXX", rng.gen_range(10000..=99999))
}

/// The feed of one session.
#[derive(Clone, Default)]
pub struct CallSimulator {
    feed: Arc<Mutex<CallFeed>>,
    timing: SimulationTiming,
}

impl CallSimulator {
    pub fn new(timing: SimulationTiming) -> Self {
        Self {
            feed: Arc::default(),
            timing,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CallFeed> {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> CallFeed {
        self.lock().clone()
    }

    /// Zero the counters. The entries are kept.
    pub fn reset_metrics(&self) {
        self.lock().metrics = CallMetrics::default();
    }

    /// Play the demo call: ring, a question answered from the FAQ, hang up.
    pub async fn run_script(&self) {
        tokio::time::sleep(self.timing.call_ring_delay).await;
        let caller = caller_number(&mut rand::thread_rng());
        {
            let mut feed = self.lock();
            feed.push(
                CallKind::Incoming,
                format!("Incoming call from {} – Answered by AI", caller),
            );
            feed.metrics.current_calls = 1;
            feed.metrics.total_calls_today += 1;
        }
        debug!(caller = %caller, "Simulated call started");

        tokio::time::sleep(self.timing.call_answer_delay).await;
        self.lock().push(
            CallKind::Answered,
            "User asked about service pricing – Answered from FAQ",
        );

        tokio::time::sleep(self.timing.call_end_delay).await;
        {
            let mut feed = self.lock();
            feed.push(CallKind::Ended, "Call ended – Duration: 2m 15s");
            feed.metrics.current_calls = 0;
            feed.metrics.avg_duration = "2:15".to_string();
        }
        debug!("Simulated call ended");
    }
}
