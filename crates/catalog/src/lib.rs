use std::collections::BTreeMap;
use std::path::PathBuf;

pub mod route;

pub use route::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    NotFound,
    InvalidSlug(String),
    Corrupt(String),
    Io(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::NotFound => write!(f, "route not found"),
            CatalogError::InvalidSlug(slug) => write!(f, "invalid route slug: {slug:?}"),
            CatalogError::Corrupt(msg) => write!(f, "route data corrupt: {msg}"),
            CatalogError::Io(msg) => write!(f, "route storage error: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Read side of the data layer: routes are read once per viewing session.
pub trait RouteStore {
    fn list(&self) -> Result<Vec<String>, CatalogError>;
    fn get(&self, slug: &str) -> Result<Option<Route>, CatalogError>;

    /// Like [`RouteStore::get`], but a missing route is an error.
    fn load(&self, slug: &str) -> Result<Route, CatalogError> {
        self.get(slug)?.ok_or(CatalogError::NotFound)
    }
}

pub fn parse_route_json(raw: &str) -> Result<Route, CatalogError> {
    serde_json::from_str::<Route>(raw)
        .map(Route::normalized)
        .map_err(|e| CatalogError::Corrupt(e.to_string()))
}

#[derive(Debug, Default)]
pub struct InMemoryRouteStore {
    routes: BTreeMap<String, Route>,
}

impl InMemoryRouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, route: Route) {
        let route = route.normalized();
        self.routes.insert(route.slug.clone(), route);
    }
}

impl RouteStore for InMemoryRouteStore {
    fn list(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.routes.keys().cloned().collect())
    }

    fn get(&self, slug: &str) -> Result<Option<Route>, CatalogError> {
        Ok(self.routes.get(slug).cloned())
    }
}

/// Routes stored as `<root>/<slug>.json`, one file per route.
#[derive(Debug, Clone)]
pub struct JsonDirRouteStore {
    root: PathBuf,
}

impl JsonDirRouteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn route_path(&self, slug: &str) -> Result<PathBuf, CatalogError> {
        let valid = !slug.is_empty()
            && slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(CatalogError::InvalidSlug(slug.to_string()));
        }
        Ok(self.root.join(format!("{slug}.json")))
    }
}

impl RouteStore for JsonDirRouteStore {
    fn list(&self) -> Result<Vec<String>, CatalogError> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| CatalogError::Io(e.to_string()))?;
        let mut slugs: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        slugs.sort();
        Ok(slugs)
    }

    fn get(&self, slug: &str) -> Result<Option<Route>, CatalogError> {
        let path = self.route_path(slug)?;
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CatalogError::Io(format!("{}: {e}", path.display()))),
        };
        parse_route_json(&raw).map(Some)
    }
}
