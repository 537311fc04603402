use std::collections::BTreeMap;

use serde::Serialize;

/// Session counters (`tile.loaded`, `view_state.rejected`, ...) and gauges
/// (`cache.resident`, ...).
///
/// Sorted maps keep the serialized form stable between runs.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Metrics {
    counters: BTreeMap<&'static str, u64>,
    gauges: BTreeMap<&'static str, i64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn inc_counter(&mut self, name: &'static str, by: u64) {
        let slot = self.counters.entry(name).or_default();
        *slot = slot.saturating_add(by);
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.gauges.get(name).copied()
    }

    pub fn set_gauge(&mut self, name: &'static str, value: i64) {
        self.gauges.insert(name, value);
    }

    pub fn counters(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.counters.iter().map(|(k, v)| (*k, *v))
    }
}
