//! Health counters of the capture side
//!
//! The audio callback only bumps atomics here. The control thread polls a
//! [`StatusReporter`] and does the logging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters shared between the audio callback and the control thread
#[derive(Debug)]
pub struct ControlStatus {
    /// Failed analysis calls, per deck
    failures: Vec<AtomicU64>,
    /// Commands naming a deck that does not exist
    rejected_commands: AtomicU64,
}

impl ControlStatus {
    pub fn new(decks: usize) -> Self {
        Self {
            failures: (0..decks).map(|_| AtomicU64::new(0)).collect(),
            rejected_commands: AtomicU64::new(0),
        }
    }

    pub fn deck_count(&self) -> usize {
        self.failures.len()
    }

    #[inline]
    pub(crate) fn record_failure(&self, deck: usize) {
        if let Some(count) = self.failures.get(deck) {
            count.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub(crate) fn record_rejected_command(&self) {
        self.rejected_commands.fetch_add(1, Ordering::Relaxed);
    }

    /// Failed analyses of `deck` since start, 0 for an unknown deck
    pub fn failures(&self, deck: usize) -> u64 {
        self.failures
            .get(deck)
            .map_or(0, |count| count.load(Ordering::Relaxed))
    }

    pub fn rejected_commands(&self) -> u64 {
        self.rejected_commands.load(Ordering::Relaxed)
    }
}

/// Something that went wrong on the capture side since the last poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// `count` analysis calls of `deck` failed
    AnalysisFailed { deck: usize, count: u64 },
    /// `count` commands were dropped
    CommandsRejected { count: u64 },
}

/// Turns counter changes into log lines, on the control thread
#[derive(Debug)]
pub struct StatusReporter {
    status: Arc<ControlStatus>,
    seen_failures: Vec<u64>,
    seen_rejected: u64,
}

impl StatusReporter {
    pub fn new(status: Arc<ControlStatus>) -> Self {
        let seen_failures = vec![0; status.deck_count()];
        Self {
            status,
            seen_failures,
            seen_rejected: 0,
        }
    }

    /// Events since the previous poll, each logged as a warning
    pub fn poll(&mut self) -> Vec<StatusEvent> {
        let mut events = Vec::new();
        for (deck, seen) in self.seen_failures.iter_mut().enumerate() {
            let total = self.status.failures(deck);
            if total > *seen {
                let count = total - *seen;
                log::warn!("Timecode analysis failed {} time(s) on deck {}", count, deck + 1);
                events.push(StatusEvent::AnalysisFailed { deck, count });
                *seen = total;
            }
        }

        let rejected = self.status.rejected_commands();
        if rejected > self.seen_rejected {
            let count = rejected - self.seen_rejected;
            log::warn!("{} command(s) for unknown decks ignored", count);
            events.push(StatusEvent::CommandsRejected { count });
            self.seen_rejected = rejected;
        }
        events
    }
}
