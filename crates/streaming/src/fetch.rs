//! Network seam of the tile loader.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Status { url: String, status: u16 },
    Transport { url: String, message: String },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Status { url, status } => write!(f, "GET {url} returned {status}"),
            FetchError::Transport { url, message } => write!(f, "GET {url} failed: {message}"),
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FetchedTile {
    pub bytes: usize,
}

/// Acquires the bytes behind an image URL.
///
/// The engine never decodes images; a successful fetch only means the URL is
/// now warm for the renderer.
pub trait TileFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedTile, FetchError>>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl TileFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedTile, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let resp = self.client.get(url).send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp.bytes().await.map_err(transport)?;
        Ok(FetchedTile { bytes: body.len() })
    }
}

/// Offline fetcher with configurable latency and failures.
///
/// Used for dry runs of the viewer and for exercising the loader's timing
/// behavior without a network.
#[derive(Debug, Default)]
pub struct SimulatedFetcher {
    latency: Duration,
    overrides: BTreeMap<String, Duration>,
    failing: BTreeSet<String>,
    requests: RefCell<Vec<String>>,
}

impl SimulatedFetcher {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn with_latency_for(mut self, url: impl Into<String>, latency: Duration) -> Self {
        self.overrides.insert(url.into(), latency);
        self
    }

    pub fn with_failure(mut self, url: impl Into<String>) -> Self {
        self.failing.insert(url.into());
        self
    }

    /// URLs fetched so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl TileFetcher for SimulatedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedTile, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        let latency = self.overrides.get(url).copied().unwrap_or(self.latency);
        tokio::time::sleep(latency).await;

        if self.failing.contains(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            });
        }
        Ok(FetchedTile { bytes: 0 })
    }
}
