//! Snapshot of the browser's current location.
//!
//! Match predicates run at dispatch time against the live URL, so they need
//! more than the canonical path: the query string carries the recipe hint
//! (`rid`) and provider callbacks carry state of their own. [`PageLocation`]
//! bundles the normalised path with the decoded query pairs.

use crate::path::NormalisedPath;

/// The current path plus its decoded query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    path: NormalisedPath,
    query: Vec<(String, String)>,
}

impl PageLocation {
    /// Builds a location from a raw path and a raw query string.
    ///
    /// The query string may include or omit the leading `?`. Keys and values
    /// are percent-decoded; `+` is treated as a literal (the history API
    /// reports spaces percent-encoded).
    pub fn from_parts(path: &str, search: &str) -> Self {
        PageLocation {
            path: NormalisedPath::new(path),
            query: parse_query(search),
        }
    }

    /// Builds a location with no query string.
    pub fn from_path(path: &str) -> Self {
        Self::from_parts(path, "")
    }

    /// Builds a location from pre-decoded query pairs. Mostly useful when
    /// constructing locations by hand.
    pub fn with_query(path: &str, pairs: &[(&str, &str)]) -> Self {
        PageLocation {
            path: NormalisedPath::new(path),
            query: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// The canonical path.
    pub fn path(&self) -> &NormalisedPath {
        &self.path
    }

    /// All decoded query pairs, in order of appearance.
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// First value for `name` in the query string, if present.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The final path segment, e.g. `github` for `/auth/callback/github`.
    pub fn last_segment(&self) -> Option<&str> {
        let canonical = self.path.as_str();
        if canonical == "/" {
            return None;
        }
        canonical.rsplit('/').next().filter(|s| !s.is_empty())
    }
}

fn parse_query(search: &str) -> Vec<(String, String)> {
    let trimmed = search.trim_start_matches('?');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(key), decode(value))
        })
        .collect()
}

fn decode(component: &str) -> String {
    urlencoding::decode(component)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| component.to_string())
}

/// Whether a browser window exists. False under server-side rendering and
/// in native test builds.
#[cfg(target_arch = "wasm32")]
pub(crate) fn has_browser_window() -> bool {
    web_sys::window().is_some()
}

/// Whether a browser window exists. False under server-side rendering and
/// in native test builds.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn has_browser_window() -> bool {
    false
}

/// Reads the browser's current location.
///
/// Returns `None` when there is no window, which is the signal the registry
/// uses to mention server-side rendering in its errors.
#[cfg(target_arch = "wasm32")]
pub fn current_location() -> Option<PageLocation> {
    let window = web_sys::window()?;
    let location = window.location();
    let path = location.pathname().ok()?;
    let search = location.search().unwrap_or_default();
    Some(PageLocation::from_parts(&path, &search))
}

/// Reads the browser's current location.
///
/// Returns `None` when there is no window, which is the signal the registry
/// uses to mention server-side rendering in its errors.
#[cfg(not(target_arch = "wasm32"))]
pub fn current_location() -> Option<PageLocation> {
    tracing::trace!("current_location: no browser window on this platform");
    None
}
