//! Async drivers for the tile loader.
//!
//! Both drivers run on a single thread (`Rc<RefCell<…>>`, no `Send`), and
//! never hold a `RefCell` borrow across an `.await`: the loader is borrowed
//! only to read or commit state between suspension points.

use std::cell::RefCell;
use std::rc::Rc;

use futures_util::future::join_all;

use crate::fetch::{FetchedTile, TileFetcher};
use crate::generation::Generation;
use crate::loader::{LadderPlan, LadderStep, StepOutcome, StepStart, TileLoader};
use crate::tier::Tier;

/// Runs every step of `plan` concurrently, each after its own delay.
///
/// Returns the outcome per tier, in plan order.
pub async fn run_ladder<F: TileFetcher>(
    loader: Rc<RefCell<TileLoader>>,
    fetcher: Rc<F>,
    plan: LadderPlan,
) -> Vec<(Tier, StepOutcome)> {
    let LadderPlan {
        generation,
        index,
        steps,
    } = plan;

    let steps = steps
        .into_iter()
        .map(|step| run_step(&loader, fetcher.as_ref(), generation, index, step));
    join_all(steps).await
}

async fn run_step<F: TileFetcher>(
    loader: &RefCell<TileLoader>,
    fetcher: &F,
    generation: Generation,
    index: usize,
    step: LadderStep,
) -> (Tier, StepOutcome) {
    if !step.delay.is_zero() {
        tokio::time::sleep(step.delay).await;
    }

    let start = loader.borrow_mut().begin_step(generation, &step.url);
    let result = match start {
        StepStart::Stale => return (step.tier, StepOutcome::Abandoned),
        StepStart::Cached => Ok(FetchedTile { bytes: 0 }),
        StepStart::Fetch => fetcher.fetch(&step.url).await,
    };

    let outcome = loader
        .borrow_mut()
        .complete(generation, index, step.tier, &step.url, result);
    (step.tier, outcome)
}

/// Drains the loader's preload queue one fetch at a time.
///
/// Best-effort: failures are recorded in the cache and otherwise ignored.
/// Returns the number of thumbnails that became resident.
pub async fn run_preloads<F: TileFetcher>(
    loader: Rc<RefCell<TileLoader>>,
    fetcher: Rc<F>,
) -> usize {
    let mut loaded = 0;
    loop {
        let next = loader.borrow_mut().next_preload();
        let Some(job) = next else {
            break;
        };
        let result = fetcher.fetch(&job.url).await;
        if loader.borrow_mut().complete_preload(&job, result) {
            loaded += 1;
        }
    }
    loaded
}

#[cfg(test)]
mod tests {
    use super::{run_ladder, run_preloads};
    use crate::fetch::SimulatedFetcher;
    use crate::loader::{LoaderConfig, StepOutcome, TileLoader};
    use crate::tier::Tier;
    use crate::url::TileUrlTemplate;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    fn shared_loader(count: usize) -> Rc<RefCell<TileLoader>> {
        Rc::new(RefCell::new(TileLoader::new(
            TileUrlTemplate::new("https://cdn", "race"),
            LoaderConfig::default(),
            count,
        )))
    }

    #[tokio::test(start_paused = true)]
    async fn ladder_upgrades_through_all_tiers() {
        let loader = shared_loader(10);
        let fetcher = Rc::new(SimulatedFetcher::new(Duration::from_millis(50)));

        let plan = loader.borrow_mut().activate(4);
        let outcomes = run_ladder(loader.clone(), fetcher.clone(), plan).await;

        assert_eq!(
            outcomes,
            vec![
                (Tier::Thumbnail, StepOutcome::Displayed(Tier::Thumbnail)),
                (Tier::Medium, StepOutcome::Displayed(Tier::Medium)),
                (Tier::Full, StepOutcome::Displayed(Tier::Full)),
            ]
        );
        assert_eq!(loader.borrow().displayed_for(4).map(|d| d.tier), Some(Tier::Full));
    }

    #[tokio::test(start_paused = true)]
    async fn index_change_discards_in_flight_medium() {
        let loader = shared_loader(10);
        let fetcher = Rc::new(SimulatedFetcher::new(Duration::from_millis(50)));

        let plan = loader.borrow_mut().activate(0);
        let old_medium = plan.steps[1].url.clone();
        let ladder = run_ladder(loader.clone(), fetcher.clone(), plan);

        // Medium for index 0 starts at 150ms and lands at 200ms.
        let switch = async {
            tokio::time::sleep(Duration::from_millis(170)).await;
            loader.borrow_mut().activate(1)
        };
        let (outcomes, _next) = tokio::join!(ladder, switch);

        assert_eq!(
            outcomes,
            vec![
                (Tier::Thumbnail, StepOutcome::Displayed(Tier::Thumbnail)),
                (Tier::Medium, StepOutcome::Stale),
                (Tier::Full, StepOutcome::Abandoned),
            ]
        );

        let l = loader.borrow();
        let shown = l.displayed().unwrap();
        assert_eq!((shown.index, shown.tier), (1, Tier::Thumbnail));
        assert!(l.cache().contains(&old_medium));
        assert!(!fetcher.requests().contains(&l.url(0, Tier::Full)));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_tier_leaves_previous_tier_displayed() {
        let loader = shared_loader(10);
        let medium = loader.borrow().url(2, Tier::Medium);
        let full = loader.borrow().url(2, Tier::Full);
        let fetcher = Rc::new(
            SimulatedFetcher::new(Duration::from_millis(10))
                .with_failure(medium)
                .with_failure(full),
        );

        let plan = loader.borrow_mut().activate(2);
        let outcomes = run_ladder(loader.clone(), fetcher, plan).await;

        assert!(matches!(outcomes[1].1, StepOutcome::Failed(_)));
        assert!(matches!(outcomes[2].1, StepOutcome::Failed(_)));
        assert_eq!(
            loader.borrow().displayed_for(2).map(|d| d.tier),
            Some(Tier::Thumbnail)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn preloaded_thumbnail_is_not_fetched_again() {
        let loader = shared_loader(10);
        let fetcher = Rc::new(SimulatedFetcher::new(Duration::from_millis(5)));

        let plan = loader.borrow_mut().activate(0);
        run_ladder(loader.clone(), fetcher.clone(), plan).await;
        let warmed = run_preloads(loader.clone(), fetcher.clone()).await;
        assert_eq!(warmed, 5);

        let next_thumb = loader.borrow().url(1, Tier::Thumbnail);
        let plan = loader.borrow_mut().activate(1);
        let outcomes = run_ladder(loader.clone(), fetcher.clone(), plan).await;

        // The warm thumbnail is shown at once; only the upgrades remain.
        assert_eq!(
            outcomes,
            vec![
                (Tier::Medium, StepOutcome::Displayed(Tier::Medium)),
                (Tier::Full, StepOutcome::Displayed(Tier::Full)),
            ]
        );
        let fetched = fetcher
            .requests()
            .iter()
            .filter(|u| **u == next_thumb)
            .count();
        assert_eq!(fetched, 1);
    }
}
