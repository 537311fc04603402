use std::cell::RefCell;
use std::rc::Rc;

use catalog::Route;
use futures_util::future::join;
use runtime::{EventBus, Metrics, Millis};
use streaming::{
    LadderPlan, StepOutcome, Tier, TileFetcher, TileLoader, run_ladder, run_preloads,
};
use tracing::{debug, info, warn};

use crate::camera::{CameraDelta, CameraState, CameraUpdate};
use crate::config::ViewerConfig;
use crate::history::{HistoryMirror, HistorySink, HistoryWrite};
use crate::navigator::{Navigator, NavigatorError, Transition};
use crate::scrubber::{PointerId, Scrubber};
use crate::view_state::{ViewDefaults, encode_view_state, parse_view_state};

/// Input events from the renderer and the page chrome.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ViewerInput {
    CameraDelta(CameraDelta),
    SetCamera(CameraUpdate),
    GoToIndex(i64),
    GoToDistance(f64),
    Next,
    Previous,
    PointerDown { pointer: PointerId, x: f64 },
    PointerMove { pointer: PointerId, x: f64 },
    PointerUp { pointer: PointerId },
    PointerCancel { pointer: PointerId },
    PointerLeave,
    TrackResized { width: f64 },
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    /// `None` only when the first image of the session could not be loaded.
    pub image_url: Option<String>,
    pub camera: CameraState,
    pub heading_offset: f64,
    pub index: usize,
    pub distance: f64,
    pub elevation_m: Option<f64>,
    pub tier: Tier,
    pub is_scrubbing: bool,
    pub has_next: bool,
    pub has_previous: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionUpdate {
    pub transition: Transition,
    pub frame: RenderFrame,
    /// Set when the input moved to another image; hand it to a ladder driver.
    pub ladder: Option<LadderPlan>,
}

/// One viewer instance for one route.
///
/// Single-threaded: the tile loader is shared with the async drivers through
/// `Rc<RefCell<…>>`, and the session itself is meant to live in one as well
/// (see [`drive_activation`]).
#[derive(Debug)]
pub struct ViewerSession {
    slug: String,
    navigator: Navigator,
    scrubber: Scrubber,
    history: HistoryMirror,
    defaults: ViewDefaults,
    loader: Rc<RefCell<TileLoader>>,
    events: EventBus,
    metrics: Metrics,
    image_unavailable: bool,
}

impl ViewerSession {
    /// Opens `route` at the position in `seed_token` (an `@…` view-state
    /// segment), or at the start. A malformed token is reported and ignored.
    ///
    /// Returns the session and the ladder for the first image.
    pub fn start(
        route: &Route,
        config: &ViewerConfig,
        seed_token: Option<&str>,
        now: Millis,
    ) -> Result<(Self, LadderPlan), NavigatorError> {
        let defaults = config.default_camera;
        let mut events = EventBus::new();
        let mut metrics = Metrics::new();

        let seed = match seed_token.map(|token| (token, parse_view_state(token, &defaults))) {
            None => defaults.state_at(0),
            Some((_, Ok(state))) => state,
            Some((token, Err(err))) => {
                warn!(token, error = %err, "ignoring malformed view state");
                events.emit(now, "view_state.rejected", format!("{token}: {err}"));
                metrics.inc_counter("view_state.rejected", 1);
                defaults.state_at(0)
            }
        };

        let navigator = Navigator::from_route(route, Some(&seed))?;
        let scrubber = Scrubber::new(
            config.scrubber(),
            route.pois.clone(),
            route.total_distance_m,
        );
        let mut loader = TileLoader::new(
            config.template_for(&route.slug),
            config.loader.clone(),
            navigator.image_count(),
        );
        let plan = loader.activate(navigator.state().current_index);

        let mut history = HistoryMirror::new(
            Millis(config.history_debounce_ms),
            seed_token.map(str::to_string),
        );
        let token = encode_view_state(&navigator.view_state(), &defaults);
        if seed_token.is_some_and(|seeded| seeded != token) {
            // Show the canonical form of what was actually opened.
            history.record(Transition::CameraChanged, token, now);
        }

        info!(
            slug = %route.slug,
            images = navigator.image_count(),
            index = navigator.state().current_index,
            "viewer session started"
        );

        let session = Self {
            slug: route.slug.clone(),
            navigator,
            scrubber,
            history,
            defaults,
            loader: Rc::new(RefCell::new(loader)),
            events,
            metrics,
            image_unavailable: false,
        };
        Ok((session, plan))
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn scrubber(&self) -> &Scrubber {
        &self.scrubber
    }

    pub fn loader(&self) -> Rc<RefCell<TileLoader>> {
        Rc::clone(&self.loader)
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn view_token(&self) -> String {
        encode_view_state(&self.navigator.view_state(), &self.defaults)
    }

    /// `true` while nothing can be shown because the session's first image
    /// failed to load.
    pub fn first_image_unavailable(&self) -> bool {
        self.image_unavailable && self.loader.borrow().displayed().is_none()
    }

    pub fn handle(&mut self, input: ViewerInput, now: Millis) -> SessionUpdate {
        let nav = &mut self.navigator;
        let transition = match input {
            ViewerInput::CameraDelta(delta) => nav.apply_camera_delta(delta),
            ViewerInput::SetCamera(update) => nav.set_camera(update),
            ViewerInput::GoToIndex(index) => nav.go_to_index(index),
            ViewerInput::GoToDistance(distance) => nav.go_to_distance(distance),
            ViewerInput::Next => nav.go_next(),
            ViewerInput::Previous => nav.go_previous(),
            ViewerInput::PointerDown { pointer, x } => self.scrubber.pointer_down(pointer, x, nav),
            ViewerInput::PointerMove { pointer, x } => self.scrubber.pointer_move(pointer, x, nav),
            ViewerInput::PointerUp { pointer } => {
                self.scrubber.pointer_up(pointer, nav);
                Transition::Unchanged
            }
            ViewerInput::PointerCancel { pointer } => {
                self.scrubber.pointer_cancel(pointer, nav);
                Transition::Unchanged
            }
            ViewerInput::PointerLeave => {
                self.scrubber.pointer_leave();
                Transition::Unchanged
            }
            ViewerInput::TrackResized { width } => {
                self.scrubber.set_track_width(width);
                Transition::Unchanged
            }
        };

        let ladder = match transition {
            Transition::IndexChanged { to, .. } => Some(self.loader.borrow_mut().activate(to)),
            _ => None,
        };
        if transition.is_change() {
            let token = self.view_token();
            self.history.record(transition, token, now);
        }

        SessionUpdate {
            transition,
            frame: self.frame(),
            ladder,
        }
    }

    /// Current render output. Picks up any tier the loader has confirmed for
    /// the current image since the last call.
    pub fn frame(&mut self) -> RenderFrame {
        let index = self.navigator.state().current_index;
        let displayed = self.loader.borrow().displayed_for(index).cloned();
        if let Some(shown) = &displayed {
            self.navigator.set_loaded_tier(index, shown.tier);
        }

        let state = self.navigator.state();
        let node = self.navigator.current_node();
        RenderFrame {
            image_url: displayed.map(|shown| shown.url),
            camera: state.camera,
            heading_offset: node.heading_offset,
            index,
            distance: state.current_distance,
            elevation_m: node.elevation_m,
            tier: state.loaded_tier,
            is_scrubbing: state.is_scrubbing,
            has_next: self.navigator.has_next(),
            has_previous: self.navigator.has_previous(),
        }
    }

    pub fn poll_history(&mut self, now: Millis, sink: &mut dyn HistorySink) -> Option<HistoryWrite> {
        self.history.poll(now, sink)
    }

    pub fn flush_history(&mut self, sink: &mut dyn HistorySink) -> Option<HistoryWrite> {
        self.history.flush(sink)
    }

    /// Folds ladder results into telemetry.
    pub fn record_outcomes(&mut self, outcomes: &[(Tier, StepOutcome)], now: Millis) {
        for (tier, outcome) in outcomes {
            match outcome {
                StepOutcome::Displayed(_) => self.metrics.inc_counter("tile.loaded", 1),
                StepOutcome::Superseded(_) => self.metrics.inc_counter("tile.superseded", 1),
                StepOutcome::Stale | StepOutcome::Abandoned => {
                    self.metrics.inc_counter("tile.stale", 1)
                }
                StepOutcome::Failed(err) => {
                    self.metrics.inc_counter("tile.failed", 1);
                    self.events.emit(now, "tile.failed", format!("{tier}: {err}"));
                }
                StepOutcome::FirstImageUnavailable(err) => {
                    self.metrics.inc_counter("tile.failed", 1);
                    self.events
                        .emit(now, "image.unavailable", format!("{tier}: {err}"));
                    self.image_unavailable = true;
                }
            }
        }
    }

    pub fn record_preloads(&mut self, loaded: usize) {
        self.metrics.inc_counter("preload.loaded", loaded as u64);
        let resident = self.loader.borrow().cache().resident_count();
        self.metrics
            .set_gauge("cache.resident", i64::try_from(resident).unwrap_or(i64::MAX));
    }
}

/// Session-local clock on tokio's (pausable) timebase.
#[derive(Debug, Copy, Clone)]
pub struct SessionClock {
    origin: tokio::time::Instant,
}

impl SessionClock {
    pub fn start() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }

    pub fn now(&self) -> Millis {
        Millis::from(self.origin.elapsed())
    }
}

/// Runs one activation: its tier ladder alongside the preload queue, then
/// records the results on the session.
pub async fn drive_activation<F: TileFetcher>(
    session: Rc<RefCell<ViewerSession>>,
    fetcher: Rc<F>,
    plan: LadderPlan,
    clock: SessionClock,
) {
    let index = plan.index;
    let loader = session.borrow().loader();
    let (outcomes, preloaded) = join(
        run_ladder(Rc::clone(&loader), Rc::clone(&fetcher), plan),
        run_preloads(loader, fetcher),
    )
    .await;
    debug!(index, steps = outcomes.len(), preloaded, "activation settled");

    let mut session = session.borrow_mut();
    session.record_outcomes(&outcomes, clock.now());
    session.record_preloads(preloaded);
}

#[cfg(test)]
mod tests {
    use super::{SessionClock, ViewerInput, ViewerSession, drive_activation};
    use crate::camera::CameraDelta;
    use crate::config::ViewerConfig;
    use crate::history::{HistoryMode, HistoryWrite};
    use crate::navigator::Transition;
    use catalog::{ImageNode, PoiMarker, Route};
    use futures_util::future::join;
    use pretty_assertions::assert_eq;
    use runtime::Millis;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;
    use streaming::{SimulatedFetcher, Tier};

    fn route(count: usize) -> Route {
        Route {
            slug: "lakeside".into(),
            name: "Lakeside 50K".into(),
            total_distance_m: (count - 1) as f64 * 100.0,
            images: (0..count)
                .map(|i| ImageNode {
                    elevation_m: Some(200.0 + i as f64),
                    heading_offset: 12.0,
                    ..ImageNode::new(i, Some(i as f64 * 100.0))
                })
                .collect(),
            pois: vec![PoiMarker {
                image_index: 2,
                distance_from_start: 200.0,
                kinds: Vec::new(),
                label: Some("Aid 1".into()),
            }],
        }
    }

    fn config() -> ViewerConfig {
        ViewerConfig {
            cdn_base: "https://cdn".into(),
            ..ViewerConfig::default()
        }
    }

    #[test]
    fn starts_from_a_seed_token() {
        let (mut s, plan) =
            ViewerSession::start(&route(5), &config(), Some("@3,90.0h,-10.0p"), Millis(0))
                .unwrap();
        assert_eq!(plan.index, 3);

        let frame = s.frame();
        assert_eq!((frame.index, frame.distance), (3, 300.0));
        assert_eq!((frame.camera.yaw(), frame.camera.pitch()), (90.0, -10.0));
        assert_eq!(frame.tier, Tier::Thumbnail);
        assert_eq!(
            frame.image_url.as_deref(),
            Some("https://cdn/races/lakeside/thumb/004.avif")
        );
        assert_eq!(frame.elevation_m, Some(203.0));
        assert_eq!(frame.heading_offset, 12.0);
    }

    #[test]
    fn malformed_seed_is_reported_and_ignored() {
        let (s, plan) =
            ViewerSession::start(&route(5), &config(), Some("@north"), Millis(0)).unwrap();
        assert_eq!(plan.index, 0);
        assert_eq!(s.metrics().counter("view_state.rejected"), 1);
        assert_eq!(s.events().count_kind("view_state.rejected"), 1);
    }

    #[test]
    fn clamped_seed_is_rewritten_in_place() {
        let (mut s, _) =
            ViewerSession::start(&route(5), &config(), Some("@99"), Millis(0)).unwrap();
        let mut sink: Vec<HistoryWrite> = Vec::new();
        s.poll_history(Millis(300), &mut sink);
        assert_eq!(
            sink,
            vec![HistoryWrite {
                token: "@4".into(),
                mode: HistoryMode::Replace,
            }]
        );
    }

    #[test]
    fn inputs_drive_navigation_and_history() {
        let (mut s, _) = ViewerSession::start(&route(5), &config(), None, Millis(0)).unwrap();
        let mut sink: Vec<HistoryWrite> = Vec::new();

        let update = s.handle(ViewerInput::Next, Millis(0));
        assert_eq!(update.transition, Transition::IndexChanged { from: 0, to: 1 });
        assert_eq!(update.ladder.as_ref().map(|p| p.index), Some(1));
        assert!(update.frame.has_previous);

        let update = s.handle(
            ViewerInput::CameraDelta(CameraDelta {
                yaw: 30.0,
                ..CameraDelta::default()
            }),
            Millis(100),
        );
        assert_eq!(update.ladder, None);

        s.poll_history(Millis(400), &mut sink);
        assert_eq!(
            sink,
            vec![HistoryWrite {
                token: "@1,30.0h,0.0p".into(),
                mode: HistoryMode::Push,
            }]
        );

        s.handle(
            ViewerInput::CameraDelta(CameraDelta {
                pitch: 5.0,
                ..CameraDelta::default()
            }),
            Millis(1000),
        );
        s.poll_history(Millis(1300), &mut sink);
        assert_eq!(sink[1].mode, HistoryMode::Replace);
        assert_eq!(sink[1].token, "@1,30.0h,5.0p");
    }

    #[test]
    fn scrubbing_through_the_session() {
        let (mut s, _) = ViewerSession::start(&route(5), &config(), None, Millis(0)).unwrap();
        s.handle(ViewerInput::TrackResized { width: 400.0 }, Millis(0));

        // 190 m resolves to the image at 200 m, where the marker sits.
        let update = s.handle(ViewerInput::PointerDown { pointer: 1, x: 190.0 }, Millis(0));
        assert_eq!(update.frame.index, 2);
        assert!(update.frame.is_scrubbing);
        assert!(update.ladder.is_some());

        let update = s.handle(ViewerInput::PointerUp { pointer: 1 }, Millis(10));
        assert!(!update.frame.is_scrubbing);
        assert_eq!(update.transition, Transition::Unchanged);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_tier_for_a_previous_image_never_reaches_the_frame() {
        let cfg = config();
        let (session, plan) = ViewerSession::start(&route(5), &cfg, None, Millis(0)).unwrap();
        let session = Rc::new(RefCell::new(session));
        let template = cfg.template_for("lakeside");
        let fetcher = Rc::new(
            SimulatedFetcher::new(Duration::from_millis(10))
                .with_latency_for(template.url(0, Tier::Medium), Duration::from_millis(100)),
        );
        let clock = SessionClock::start();

        let first = drive_activation(Rc::clone(&session), Rc::clone(&fetcher), plan, clock);
        let navigate = async {
            // Medium for image 0 is in flight (150 ms + 100 ms latency).
            tokio::time::sleep(Duration::from_millis(200)).await;
            session.borrow_mut().handle(ViewerInput::Next, clock.now())
        };
        let ((), update) = join(first, navigate).await;
        assert_eq!(update.frame.index, 1);

        let frame = session.borrow_mut().frame();
        assert_eq!(frame.index, 1);
        assert_eq!(frame.tier, Tier::Thumbnail);
        assert_eq!(
            frame.image_url.as_deref(),
            Some("https://cdn/races/lakeside/thumb/002.avif")
        );

        let s = session.borrow();
        // Image 0: thumbnail shown, medium stale, full never started.
        assert_eq!(s.metrics().counter("tile.loaded"), 1);
        assert_eq!(s.metrics().counter("tile.stale"), 2);
        assert_eq!(s.metrics().counter("preload.loaded"), 4);
        // Five thumbnails plus the stale medium, which is still cached.
        assert_eq!(s.metrics().gauge("cache.resident"), Some(6));
    }

    #[tokio::test(start_paused = true)]
    async fn first_image_failure_is_user_visible() {
        let cfg = config();
        let (session, plan) = ViewerSession::start(&route(3), &cfg, None, Millis(0)).unwrap();
        let session = Rc::new(RefCell::new(session));
        let template = cfg.template_for("lakeside");
        let fetcher = Rc::new(
            SimulatedFetcher::new(Duration::from_millis(10))
                .with_failure(template.url(0, Tier::Thumbnail))
                .with_failure(template.url(0, Tier::Medium))
                .with_failure(template.url(0, Tier::Full)),
        );

        drive_activation(Rc::clone(&session), fetcher, plan, SessionClock::start()).await;

        let mut s = session.borrow_mut();
        assert!(s.first_image_unavailable());
        assert_eq!(s.frame().image_url, None);
        assert_eq!(s.events().count_kind("image.unavailable"), 1);
        assert_eq!(s.events().count_kind("tile.failed"), 2);
        assert_eq!(s.metrics().counter("tile.failed"), 3);
    }
}
