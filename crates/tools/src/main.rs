use std::cell::RefCell;
use std::env;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use catalog::{JsonDirRouteStore, Route, RouteStore};
use clap::{Parser, Subcommand};
use serde_json::json;
use streaming::{HttpFetcher, SimulatedFetcher, Tier, TileFetcher};
use tokio::task::LocalSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use viewer::{
    HistoryWrite, RenderFrame, SessionClock, ViewState, ViewerConfig, ViewerInput, ViewerSession,
    VisualDistanceTable, drive_activation, encode_view_state, find_view_state_segment,
    parse_view_state,
};

mod script;

use script::{ScriptStep, parse_script};

#[derive(Parser, Debug)]
#[command(author, version, about = "Route panorama viewer tooling")]
struct Args {
    /// Viewer config JSON (falls back to ROUTEVIEW_CONFIG, then built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Image CDN origin (falls back to ROUTEVIEW_CDN_BASE, then the config)
    #[arg(long)]
    cdn_base: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize a route: images, markers, tile URLs
    Inspect {
        /// Directory of `<slug>.json` route files
        #[arg(long, default_value = "data/routes")]
        routes: PathBuf,

        slug: String,
    },

    /// Encode a view state into an `@…` path segment
    Encode {
        #[arg(long)]
        position: usize,

        #[arg(long, allow_hyphen_values = true)]
        heading: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        pitch: Option<f64>,

        #[arg(long)]
        fov: Option<f64>,
    },

    /// Decode an `@…` token, or a full path containing one
    Decode {
        #[arg(allow_hyphen_values = true)]
        input: String,
    },

    /// Play a timed input script against a viewer session
    Replay {
        #[arg(long, default_value = "data/routes")]
        routes: PathBuf,

        slug: String,

        /// JSON script of timed inputs
        #[arg(long)]
        script: PathBuf,

        /// Initial `@…` view state
        #[arg(long)]
        at: Option<String>,

        /// Fetch tiles over HTTP instead of simulating them
        #[arg(long)]
        online: bool,

        /// Simulated fetch latency
        #[arg(long, default_value_t = 40)]
        latency_ms: u64,

        /// Extra time to let in-flight tiles settle after the last step
        #[arg(long, default_value_t = 1000)]
        settle_ms: u64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = load_config(args.config, args.cdn_base)?;

    match args.command {
        Command::Inspect { routes, slug } => inspect(&routes, &slug, &config)?,
        Command::Encode {
            position,
            heading,
            pitch,
            fov,
        } => {
            let defaults = config.default_camera;
            let state = ViewState {
                position,
                heading: heading.unwrap_or(defaults.heading),
                pitch: pitch.unwrap_or(defaults.pitch),
                fov: fov.unwrap_or(defaults.fov),
            };
            println!("{}", encode_view_state(&state, &defaults));
        }
        Command::Decode { input } => {
            let token = find_view_state_segment(&input).unwrap_or(&input);
            let state = parse_view_state(token, &config.default_camera)?;
            println!(
                "{}",
                json!({
                    "position": state.position,
                    "heading": state.heading,
                    "pitch": state.pitch,
                    "fov": state.fov,
                })
            );
        }
        Command::Replay {
            routes,
            slug,
            script,
            at,
            online,
            latency_ms,
            settle_ms,
        } => {
            let route = JsonDirRouteStore::new(routes).load(&slug)?;
            let steps = parse_script(&std::fs::read_to_string(&script)?)?;
            let settle = Duration::from_millis(settle_ms);
            let local = LocalSet::new();
            if online {
                let fetcher = Rc::new(HttpFetcher::new(reqwest::Client::new()));
                local
                    .run_until(replay(&route, &config, at.as_deref(), &steps, fetcher, settle))
                    .await?;
            } else {
                let fetcher = Rc::new(SimulatedFetcher::new(Duration::from_millis(latency_ms)));
                local
                    .run_until(replay(&route, &config, at.as_deref(), &steps, fetcher, settle))
                    .await?;
            }
        }
    }

    Ok(())
}

fn load_config(
    path: Option<PathBuf>,
    cdn_base: Option<String>,
) -> Result<ViewerConfig, Box<dyn std::error::Error>> {
    let path = path.or_else(|| env::var("ROUTEVIEW_CONFIG").ok().map(PathBuf::from));
    let mut config = match path {
        Some(p) => ViewerConfig::load(&p)?,
        None => ViewerConfig::default(),
    };
    if let Some(base) = cdn_base.or_else(|| env::var("ROUTEVIEW_CDN_BASE").ok()) {
        config.cdn_base = base;
    }
    Ok(config)
}

fn inspect(
    routes: &Path,
    slug: &str,
    config: &ViewerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let route = JsonDirRouteStore::new(routes).load(slug)?;
    let table = VisualDistanceTable::from_nodes(&route.images);
    let spread = route
        .distances()
        .iter()
        .zip(table.values())
        .filter(|(raw, visual)| raw != visual)
        .count();
    let template = config.template_for(&route.slug);
    let first_urls: serde_json::Map<String, serde_json::Value> = Tier::ALL
        .into_iter()
        .map(|tier| (tier.to_string(), json!(template.url(0, tier))))
        .collect();

    let summary = json!({
        "slug": route.slug,
        "name": route.name,
        "images": route.image_count(),
        "total_distance_m": route.total_distance_m,
        "pois": route.pois.len(),
        "spread_images": spread,
        "visual_total": table.total(),
        "first_image": first_urls,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn replay<F: TileFetcher + 'static>(
    route: &Route,
    config: &ViewerConfig,
    at: Option<&str>,
    steps: &[ScriptStep],
    fetcher: Rc<F>,
    settle: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let clock = SessionClock::start();
    let origin = tokio::time::Instant::now();
    let (session, plan) = ViewerSession::start(route, config, at, clock.now())?;
    let session = Rc::new(RefCell::new(session));
    let mut drivers = vec![tokio::task::spawn_local(drive_activation(
        Rc::clone(&session),
        Rc::clone(&fetcher),
        plan,
        clock,
    ))];
    let mut history: Vec<HistoryWrite> = Vec::new();

    info!(slug = %route.slug, steps = steps.len(), "replay started");
    for step in steps {
        tokio::time::sleep_until(origin + Duration::from_millis(step.at_ms)).await;
        let now = clock.now();
        let update = session.borrow_mut().handle(ViewerInput::from(&step.op), now);
        if let Some(plan) = update.ladder {
            drivers.push(tokio::task::spawn_local(drive_activation(
                Rc::clone(&session),
                Rc::clone(&fetcher),
                plan,
                clock,
            )));
        }
        session.borrow_mut().poll_history(now, &mut history);
        print_frame(now.0, &update.frame);
    }

    tokio::time::sleep(settle).await;
    for driver in drivers {
        if let Err(err) = driver.await {
            warn!(error = %err, "ladder driver failed");
        }
    }

    let mut session = session.borrow_mut();
    session.flush_history(&mut history);
    let frame = session.frame();
    print_frame(clock.now().0, &frame);

    for write in &history {
        println!("{}", json!({ "history": write.token, "mode": format!("{:?}", write.mode) }));
    }
    for event in session.events().iter() {
        println!("{}", serde_json::to_string(event)?);
    }
    println!("{}", serde_json::to_string(session.metrics())?);
    Ok(())
}

fn print_frame(at_ms: u64, frame: &RenderFrame) {
    println!(
        "{}",
        json!({
            "at_ms": at_ms,
            "index": frame.index,
            "distance": frame.distance,
            "tier": frame.tier.to_string(),
            "image": frame.image_url,
            "yaw": frame.camera.yaw(),
            "pitch": frame.camera.pitch(),
            "fov": frame.camera.fov(),
            "scrubbing": frame.is_scrubbing,
        })
    );
}
