use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::LoadCache;
use crate::fetch::{FetchError, FetchedTile};
use crate::generation::{Generation, GenerationCounter};
use crate::preload::{PreloadJob, PreloadQueue, preload_window};
use crate::residency::ResidencyState;
use crate::tier::Tier;
use crate::url::TileUrlTemplate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Delay before the medium tier is requested, counted from activation.
    pub medium_delay_ms: u64,
    /// Delay before the full tier is requested, counted from activation.
    pub full_delay_ms: u64,
    pub preload_ahead: usize,
    pub preload_behind: usize,
    pub max_pending_preloads: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            medium_delay_ms: 150,
            full_delay_ms: 600,
            preload_ahead: 5,
            preload_behind: 2,
            max_pending_preloads: 16,
        }
    }
}

impl LoaderConfig {
    pub fn delay_for(&self, tier: Tier) -> Duration {
        match tier {
            Tier::Thumbnail => Duration::ZERO,
            Tier::Medium => Duration::from_millis(self.medium_delay_ms),
            Tier::Full => Duration::from_millis(self.full_delay_ms),
        }
    }
}

/// The image currently handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Displayed {
    pub index: usize,
    pub tier: Tier,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderStep {
    pub tier: Tier,
    pub url: String,
    pub delay: Duration,
}

/// Remaining tier upgrades for one activation of an image index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderPlan {
    pub generation: Generation,
    pub index: usize,
    pub steps: Vec<LadderStep>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepStart {
    Fetch,
    /// The URL finished loading elsewhere (e.g. by a preload) in the meantime.
    Cached,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The tier is now the displayed one for the active index.
    Displayed(Tier),
    /// A higher tier was already displayed when this one arrived.
    Superseded(Tier),
    /// The active index changed while the step was in flight.
    Stale,
    /// The active index changed before the step started; nothing was fetched.
    Abandoned,
    Failed(FetchError),
    /// The first thumbnail of the session failed: there is nothing to show.
    FirstImageUnavailable(FetchError),
}

/// Tier-ladder state for one viewer session.
///
/// The loader itself never waits: `activate` produces a [`LadderPlan`], and a
/// driver (see `ladder::run_ladder`) sleeps, fetches, and reports each step
/// back through `begin_step` / `complete`. Every report carries the
/// [`Generation`] it was planned under, and only reports for the current
/// generation may change what is displayed.
#[derive(Debug)]
pub struct TileLoader {
    template: TileUrlTemplate,
    config: LoaderConfig,
    image_count: usize,
    cache: LoadCache,
    generations: GenerationCounter,
    active_index: Option<usize>,
    displayed: Option<Displayed>,
    preloads: PreloadQueue,
    any_confirmed: bool,
}

impl TileLoader {
    pub fn new(template: TileUrlTemplate, config: LoaderConfig, image_count: usize) -> Self {
        let preloads = PreloadQueue::new(config.max_pending_preloads);
        Self {
            template,
            config,
            image_count,
            cache: LoadCache::new(),
            generations: GenerationCounter::new(),
            active_index: None,
            displayed: None,
            preloads,
            any_confirmed: false,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn template(&self) -> &TileUrlTemplate {
        &self.template
    }

    pub fn cache(&self) -> &LoadCache {
        &self.cache
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active_index
    }

    pub fn current_generation(&self) -> Generation {
        self.generations.current()
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.generations.is_current(generation)
    }

    pub fn displayed(&self) -> Option<&Displayed> {
        self.displayed.as_ref()
    }

    /// Displayed image, but only if it belongs to `index`.
    pub fn displayed_for(&self, index: usize) -> Option<&Displayed> {
        self.displayed.as_ref().filter(|d| d.index == index)
    }

    pub fn pending_preloads(&self) -> &PreloadQueue {
        &self.preloads
    }

    pub fn url(&self, index: usize, tier: Tier) -> String {
        self.template.url(index, tier)
    }

    /// Makes `index` the active image and plans its tier ladder.
    ///
    /// Any ladder planned earlier becomes stale. If a tier above the thumbnail
    /// already loaded for this index, it is displayed right away and only the
    /// tiers above it are planned.
    pub fn activate(&mut self, index: usize) -> LadderPlan {
        let index = index.min(self.image_count.saturating_sub(1));
        let generation = self.generations.advance();
        self.active_index = Some(index);

        let best_cached = Tier::ALL
            .into_iter()
            .rev()
            .find(|tier| self.cache.contains(&self.template.url(index, *tier)));

        let shown = best_cached.unwrap_or(Tier::Thumbnail);
        self.displayed = Some(Displayed {
            index,
            tier: shown,
            url: self.template.url(index, shown),
        });

        let steps = Tier::ALL
            .into_iter()
            .filter(|tier| best_cached.is_none_or(|cached| *tier > cached))
            .map(|tier| LadderStep {
                tier,
                url: self.template.url(index, tier),
                delay: self.config.delay_for(tier),
            })
            .collect::<Vec<_>>();

        debug!(
            index,
            generation = generation.0,
            cached = ?best_cached,
            steps = steps.len(),
            "activated image"
        );

        self.reschedule_preloads(index);

        LadderPlan {
            generation,
            index,
            steps,
        }
    }

    /// Called by the driver when a step's delay has elapsed.
    pub fn begin_step(&mut self, generation: Generation, url: &str) -> StepStart {
        if !self.is_current(generation) {
            return StepStart::Stale;
        }
        match self.cache.request(url) {
            ResidencyState::Resident => StepStart::Cached,
            _ => {
                let _ = self.cache.set_state(url, ResidencyState::Loading);
                StepStart::Fetch
            }
        }
    }

    /// Commits the result of one ladder step.
    ///
    /// A successful load enters the cache even when stale; it just is not
    /// displayed.
    pub fn complete(
        &mut self,
        generation: Generation,
        index: usize,
        tier: Tier,
        url: &str,
        result: Result<FetchedTile, FetchError>,
    ) -> StepOutcome {
        let loaded = match result {
            Ok(_) => {
                self.cache.mark_resident(url);
                Ok(())
            }
            Err(err) => {
                self.cache.mark_failed(url);
                Err(err)
            }
        };

        if !self.is_current(generation) {
            debug!(index, %tier, "discarding stale tile");
            return StepOutcome::Stale;
        }

        if let Err(err) = loaded {
            warn!(index, %tier, error = %err, "tile load failed");
            if tier == Tier::Thumbnail && !self.any_confirmed {
                self.displayed = None;
                return StepOutcome::FirstImageUnavailable(err);
            }
            return StepOutcome::Failed(err);
        }

        self.any_confirmed = true;
        match &mut self.displayed {
            Some(shown) if shown.index == index && shown.tier > tier => {
                StepOutcome::Superseded(tier)
            }
            shown => {
                *shown = Some(Displayed {
                    index,
                    tier,
                    url: url.to_string(),
                });
                StepOutcome::Displayed(tier)
            }
        }
    }

    /// Next preload worth fetching; already-loaded URLs are skipped.
    pub fn next_preload(&mut self) -> Option<PreloadJob> {
        while let Some(job) = self.preloads.pop_next() {
            if self.cache.request(&job.url) != ResidencyState::Resident {
                let _ = self.cache.set_state(&job.url, ResidencyState::Loading);
                return Some(job);
            }
        }
        None
    }

    /// Records a preload result. Never touches the displayed image.
    ///
    /// Returns `true` if the thumbnail is newly cached.
    pub fn complete_preload(
        &mut self,
        job: &PreloadJob,
        result: Result<FetchedTile, FetchError>,
    ) -> bool {
        match result {
            Ok(_) => self.cache.mark_resident(&job.url),
            Err(err) => {
                debug!(index = job.index, error = %err, "preload failed");
                self.cache.mark_failed(&job.url);
                false
            }
        }
    }

    fn reschedule_preloads(&mut self, index: usize) {
        let jobs = preload_window(
            index,
            self.image_count,
            self.config.preload_ahead,
            self.config.preload_behind,
        )
        .into_iter()
        .map(|i| PreloadJob {
            index: i,
            url: self.template.url(i, Tier::Thumbnail),
        })
        .filter(|job| !self.cache.contains(&job.url))
        .take(self.config.max_pending_preloads)
        .collect::<Vec<_>>();

        if let Err(err) = self.preloads.reschedule(jobs) {
            debug!(error = %err, "preload window truncated");
        }
    }
}
