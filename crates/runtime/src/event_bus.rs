use std::collections::VecDeque;

use serde::Serialize;

use crate::clock::Millis;

const DEFAULT_CAPACITY: usize = 256;

/// Telemetry record for degraded behavior: failed loads, rejected input.
///
/// These are reported, never raised; the viewing session keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Monotonic within one bus, including events already evicted.
    pub seq: u64,
    pub at: Millis,
    pub kind: &'static str,
    pub message: String,
}

/// Bounded in-memory event log. Once full, the oldest events are evicted.
#[derive(Debug)]
pub struct EventBus {
    next_seq: u64,
    capacity: usize,
    events: VecDeque<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            next_seq: 0,
            capacity: capacity.max(1),
            events: VecDeque::new(),
        }
    }

    /// Records an event and returns its sequence number.
    pub fn emit(&mut self, at: Millis, kind: &'static str, message: impl Into<String>) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(Event {
            seq,
            at,
            kind,
            message: message.into(),
        });
        seq
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn count_kind(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    /// Retained events with `seq >= from`.
    pub fn since(&self, from: u64) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.seq >= from)
    }
}
