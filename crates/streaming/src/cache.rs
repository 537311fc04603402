use std::collections::BTreeMap;

use crate::residency::ResidencyState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    UnknownUrl(String),
    ResidentIsFinal(String),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::UnknownUrl(url) => write!(f, "url was never requested: {url}"),
            CacheError::ResidentIsFinal(url) => {
                write!(f, "url already loaded, state is final: {url}")
            }
        }
    }
}

impl std::error::Error for CacheError {}

/// Per-session record of image URLs and how far they got.
///
/// Membership (`contains`) means "finished loading at least once". Entries are
/// never evicted: the set is bounded by images × tiers of one route, and a
/// URL that loaded once stays displayable without a flash of a lower tier.
///
/// Notes on determinism:
/// - Entries are keyed in a `BTreeMap` for stable traversal order.
#[derive(Debug, Default)]
pub struct LoadCache {
    entries: BTreeMap<String, ResidencyState>,
    resident: usize,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of URLs seen, in any state.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resident_count(&self) -> usize {
        self.resident
    }

    pub fn state(&self, url: &str) -> Option<ResidencyState> {
        self.entries.get(url).copied()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.state(url) == Some(ResidencyState::Resident)
    }

    /// Registers interest in `url` and returns its state afterwards.
    ///
    /// Resident URLs stay resident; anything else becomes `Requested`.
    pub fn request(&mut self, url: &str) -> ResidencyState {
        let state = self
            .entries
            .entry(url.to_string())
            .or_insert(ResidencyState::Requested);
        if !state.is_final() {
            *state = ResidencyState::Requested;
        }
        *state
    }

    pub fn set_state(&mut self, url: &str, next: ResidencyState) -> Result<(), CacheError> {
        let state = self
            .entries
            .get_mut(url)
            .ok_or_else(|| CacheError::UnknownUrl(url.to_string()))?;
        if state.is_final() {
            if next.is_final() {
                return Ok(());
            }
            return Err(CacheError::ResidentIsFinal(url.to_string()));
        }
        *state = next;
        if next.is_final() {
            self.resident += 1;
        }
        Ok(())
    }

    /// Records a finished load. Returns `true` if the URL was not resident yet.
    pub fn mark_resident(&mut self, url: &str) -> bool {
        let state = self
            .entries
            .entry(url.to_string())
            .or_insert(ResidencyState::Requested);
        if state.is_final() {
            return false;
        }
        *state = ResidencyState::Resident;
        self.resident += 1;
        true
    }

    /// Records a failed load. A resident URL keeps its state.
    pub fn mark_failed(&mut self, url: &str) {
        let state = self
            .entries
            .entry(url.to_string())
            .or_insert(ResidencyState::Failed);
        if !state.is_final() {
            *state = ResidencyState::Failed;
        }
    }
}
