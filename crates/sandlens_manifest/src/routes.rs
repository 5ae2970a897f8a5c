//! Route table extraction.
//!
//! Best-effort text matching over conventional layouts; it does not parse JSX,
//! so nested braces and attributes split across lines are missed.

use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;

use sandlens_core::{FileMap, RouteInfo};

/// `path="..."` followed on the same line by `element={...}` or `component={...}`
static ROUTE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"path=["']([^"']+)["'].*(?:element|component)=\{([^}]+)\}"#).unwrap()
});

static SOURCE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(jsx?|tsx?)$").unwrap());

const ROUTER_MARKERS: &[&str] = &["<Route", "createBrowserRouter"];
const PAGE_PREFIXES: &[&str] = &["src/pages/", "pages/"];

/// Produces the route table of a manifest.
pub trait RouteExtractor: Send + Sync {
    fn extract(&self, files: &FileMap) -> Vec<RouteInfo>;
}

/// Declarative-router scan plus the `pages/` filesystem convention.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicRouteExtractor;

impl RouteExtractor for HeuristicRouteExtractor {
    fn extract(&self, files: &FileMap) -> Vec<RouteInfo> {
        let mut routes = Vec::new();

        for (path, info) in files {
            if ROUTER_MARKERS.iter().any(|marker| info.content.contains(marker)) {
                for captures in ROUTE_PATTERN.captures_iter(&info.content) {
                    trace!("Router route '{}' in {}", &captures[1], path);
                    routes.push(RouteInfo { path: captures[1].to_string(), component: path.clone() });
                }
            }

            if let Some(route_path) = filesystem_route(&info.relative_path) {
                trace!("Filesystem route '{}' for {}", route_path, path);
                routes.push(RouteInfo { path: route_path, component: path.clone() });
            }
        }

        debug!("Extracted {} routes from {} files", routes.len(), files.len());
        routes
    }
}

/// Route path for a file under `pages/` or `src/pages/`.
///
/// A literal string transform: the prefix, a source extension and a trailing
/// `index` are removed and `/` is prepended, so `pages/index.jsx` maps to `/`
/// and `pages/blog/index.jsx` to `/blog/`.
pub fn filesystem_route(relative_path: &str) -> Option<String> {
    let rest = PAGE_PREFIXES.iter().find_map(|prefix| relative_path.strip_prefix(prefix))?;
    let without_ext = SOURCE_SUFFIX.replace(rest, "");
    let without_index = without_ext.strip_suffix("index").unwrap_or(&without_ext);
    Some(format!("/{}", without_index))
}
