use runtime::{Debouncer, Millis};
use tracing::debug;

use crate::navigator::Transition;

pub const DEFAULT_HISTORY_DEBOUNCE_MS: u64 = 300;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HistoryMode {
    /// New history entry (moved along the route).
    Push,
    /// Rewrite the current entry (camera only).
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryWrite {
    pub token: String,
    pub mode: HistoryMode,
}

/// Receives the address-bar writes.
pub trait HistorySink {
    fn write(&mut self, write: &HistoryWrite);
}

impl HistorySink for Vec<HistoryWrite> {
    fn write(&mut self, write: &HistoryWrite) {
        self.push(write.clone());
    }
}

/// Debounced mirror of the view-state token.
///
/// A burst of transitions produces one write carrying the last token. If any
/// transition in the burst moved along the route the write is a `Push`.
#[derive(Debug, Clone)]
pub struct HistoryMirror {
    pending: Debouncer<HistoryWrite>,
    last_written: Option<String>,
}

impl HistoryMirror {
    /// `current_token` is what the address bar already shows, if known.
    pub fn new(window: Millis, current_token: Option<String>) -> Self {
        Self {
            pending: Debouncer::new(window),
            last_written: current_token,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    pub fn due_at(&self) -> Option<Millis> {
        self.pending.due_at()
    }

    pub fn last_written(&self) -> Option<&str> {
        self.last_written.as_deref()
    }

    pub fn record(&mut self, transition: Transition, token: String, now: Millis) {
        let mode = match transition {
            Transition::IndexChanged { .. } => HistoryMode::Push,
            Transition::CameraChanged => HistoryMode::Replace,
            Transition::Unchanged => return,
        };
        self.pending
            .push_with(HistoryWrite { token, mode }, now, |prev, next| HistoryWrite {
                token: next.token,
                mode: if prev.mode == HistoryMode::Push {
                    HistoryMode::Push
                } else {
                    next.mode
                },
            });
    }

    /// Writes the pending token into `sink` once the quiet window has passed.
    pub fn poll(&mut self, now: Millis, sink: &mut dyn HistorySink) -> Option<HistoryWrite> {
        let write = self.pending.poll(now)?;
        self.commit(write, sink)
    }

    /// Writes the pending token immediately.
    pub fn flush(&mut self, sink: &mut dyn HistorySink) -> Option<HistoryWrite> {
        let write = self.pending.flush()?;
        self.commit(write, sink)
    }

    fn commit(&mut self, write: HistoryWrite, sink: &mut dyn HistorySink) -> Option<HistoryWrite> {
        if self.last_written.as_deref() == Some(write.token.as_str()) {
            debug!(token = %write.token, "history: unchanged token, skipped");
            return None;
        }
        sink.write(&write);
        self.last_written = Some(write.token.clone());
        Some(write)
    }
}
