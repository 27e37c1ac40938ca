// ── Run outcome history ──
//
// Bounded, most-recent-first record of run outcomes. Written once per run
// by the synchronizer's callback, read concurrently by the health endpoint.
// Readers load an immutable snapshot; the writer swaps in a new one.

use std::collections::VecDeque;
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::trace;

use crate::callback::SyncCallback;
use crate::error::SyncError;

/// Number of outcomes retained.
pub const HISTORY_CAPACITY: usize = 5;

/// Result of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub timestamp: DateTime<Utc>,
    pub success: bool,
}

impl Outcome {
    pub fn now(success: bool) -> Self {
        Self {
            timestamp: Utc::now(),
            success,
        }
    }
}

/// Outcome history shared between the sync loop and the health endpoint.
#[derive(Debug)]
pub struct SyncState {
    history: ArcSwap<VecDeque<Outcome>>,
    capacity: usize,
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncState {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            history: ArcSwap::from_pointee(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Push an outcome to the front, evicting the oldest beyond capacity.
    pub fn record(&self, outcome: Outcome) {
        trace!(success = outcome.success, "recording outcome");
        self.history.rcu(|current| {
            let mut next = VecDeque::clone(current);
            next.push_front(outcome);
            next.truncate(self.capacity);
            Arc::new(next)
        });
    }

    /// Snapshot of the history, most recent first.
    pub fn outcomes(&self) -> Vec<Outcome> {
        self.history.load().iter().copied().collect()
    }

    pub fn latest(&self) -> Option<Outcome> {
        self.history.load().front().copied()
    }

    /// Healthy iff the most recent run exists and succeeded.
    pub fn healthy(&self) -> bool {
        self.latest().is_some_and(|outcome| outcome.success)
    }
}

#[async_trait]
impl SyncCallback for SyncState {
    async fn on_success(&self) {
        self.record(Outcome::now(true));
    }

    async fn on_failure(&self, _error: &SyncError) {
        self.record(Outcome::now(false));
    }
}
