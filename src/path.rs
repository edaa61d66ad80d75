//! Canonical URL-path value type.
//!
//! Every path that enters the routing layer is normalised exactly once, at
//! the edge, into a [`NormalisedPath`]. The routing table is keyed by the
//! canonical string, so two paths are "the same route" if and only if their
//! normalised forms are equal. Construction is total: any input string
//! produces some canonical path rather than an error.

use serde::{Deserialize, Serialize};

/// A URL path in canonical form.
///
/// Canonical form guarantees:
/// - a single leading `/`, no trailing `/` (the root is just `/`)
/// - no query string or fragment
/// - no scheme or authority (full URLs are reduced to their path)
/// - no duplicate slash runs
///
/// # Example
///
/// ```
/// use dxauthkit::NormalisedPath;
///
/// let path = NormalisedPath::new("https://example.com/auth/callback/github/?code=abc");
/// assert_eq!(path.as_str(), "/auth/callback/github");
/// assert_eq!(path, NormalisedPath::new("/auth/callback/github"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct NormalisedPath(String);

impl NormalisedPath {
    /// Normalises `raw` into a canonical path.
    ///
    /// Accepts plain paths (`/auth`), paths missing the leading slash
    /// (`auth`), and full URLs (`https://example.com/auth?x=1`). Query
    /// strings and fragments are discarded.
    pub fn new(raw: &str) -> Self {
        let mut rest = raw.trim();

        // Fragment and query never participate in route identity.
        if let Some(idx) = rest.find('#') {
            rest = &rest[..idx];
        }
        if let Some(idx) = rest.find('?') {
            rest = &rest[..idx];
        }

        // Reduce full URLs to their path component.
        if let Some(idx) = rest.find("://") {
            let after_scheme = &rest[idx + 3..];
            rest = match after_scheme.find('/') {
                Some(slash) => &after_scheme[slash..],
                None => "",
            };
        } else if !rest.starts_with('/') && looks_like_authority(rest) {
            rest = match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => "",
            };
        }

        let mut canonical = String::with_capacity(rest.len() + 1);
        canonical.push('/');
        let mut prev_was_slash = true;
        for ch in rest.chars() {
            if ch == '/' {
                if !prev_was_slash {
                    canonical.push('/');
                }
                prev_was_slash = true;
            } else {
                canonical.push(ch);
                prev_was_slash = false;
            }
        }

        // Trailing slash is stripped everywhere except the root.
        if canonical.len() > 1 && canonical.ends_with('/') {
            canonical.pop();
        }

        NormalisedPath(canonical)
    }

    /// The canonical string. This is the routing table key and the only
    /// form paths are compared in.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the root path `/`.
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Appends `other` underneath this path.
    ///
    /// # Example
    ///
    /// ```
    /// use dxauthkit::NormalisedPath;
    ///
    /// let base = NormalisedPath::new("/auth");
    /// assert_eq!(base.join(&NormalisedPath::new("/verify")).as_str(), "/auth/verify");
    /// ```
    pub fn join(&self, other: &NormalisedPath) -> NormalisedPath {
        if other.is_root() {
            return self.clone();
        }
        if self.is_root() {
            return other.clone();
        }
        NormalisedPath(format!("{}{}", self.0, other.0))
    }

    /// Whether this path is `base` itself or lives underneath it.
    pub fn starts_with(&self, base: &NormalisedPath) -> bool {
        if base.is_root() {
            return true;
        }
        self.0 == base.0 || self.0.starts_with(&format!("{}/", base.0))
    }
}

impl std::fmt::Display for NormalisedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NormalisedPath {
    fn from(raw: &str) -> Self {
        NormalisedPath::new(raw)
    }
}

impl From<String> for NormalisedPath {
    fn from(raw: String) -> Self {
        NormalisedPath::new(&raw)
    }
}

impl From<NormalisedPath> for String {
    fn from(path: NormalisedPath) -> Self {
        path.0
    }
}

/// Heuristic for inputs like `example.com/auth` or `localhost:3000/auth`
/// that carry an authority without a scheme.
fn looks_like_authority(input: &str) -> bool {
    let first_segment = input.split('/').next().unwrap_or("");
    first_segment.starts_with("localhost")
        || first_segment.contains('.')
        || first_segment.contains(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_path_untouched() {
        assert_eq!(NormalisedPath::new("/auth").as_str(), "/auth");
    }

    #[test]
    fn adds_leading_slash() {
        assert_eq!(NormalisedPath::new("auth/verify").as_str(), "/auth/verify");
    }

    #[test]
    fn strips_trailing_slash() {
        assert_eq!(NormalisedPath::new("/auth/").as_str(), "/auth");
        assert_eq!(NormalisedPath::new("/auth/verify///").as_str(), "/auth/verify");
    }

    #[test]
    fn root_stays_root() {
        assert_eq!(NormalisedPath::new("/").as_str(), "/");
        assert_eq!(NormalisedPath::new("").as_str(), "/");
        assert_eq!(NormalisedPath::new("   ").as_str(), "/");
    }

    #[test]
    fn drops_query_and_fragment() {
        assert_eq!(
            NormalisedPath::new("/auth?rid=thirdparty&code=abc").as_str(),
            "/auth"
        );
        assert_eq!(NormalisedPath::new("/auth#section").as_str(), "/auth");
        assert_eq!(NormalisedPath::new("/auth?x=1#y").as_str(), "/auth");
    }

    #[test]
    fn strips_scheme_and_authority() {
        assert_eq!(
            NormalisedPath::new("https://example.com/auth/callback/github").as_str(),
            "/auth/callback/github"
        );
        assert_eq!(NormalisedPath::new("http://localhost:3000/auth").as_str(), "/auth");
        assert_eq!(NormalisedPath::new("https://example.com").as_str(), "/");
    }

    #[test]
    fn strips_bare_authority() {
        assert_eq!(NormalisedPath::new("example.com/auth").as_str(), "/auth");
        assert_eq!(NormalisedPath::new("localhost:3000/auth").as_str(), "/auth");
    }

    #[test]
    fn collapses_duplicate_slashes() {
        assert_eq!(NormalisedPath::new("/auth//verify").as_str(), "/auth/verify");
        assert_eq!(NormalisedPath::new("//auth///verify").as_str(), "/auth/verify");
    }

    #[test]
    fn normalisation_is_idempotent() {
        let once = NormalisedPath::new("https://example.com/auth//verify/?x=1");
        let twice = NormalisedPath::new(once.as_str());
        assert_eq!(once, twice);
    }

    #[test]
    fn join_paths() {
        let base = NormalisedPath::new("/auth");
        assert_eq!(base.join(&NormalisedPath::new("/verify")).as_str(), "/auth/verify");
        assert_eq!(base.join(&NormalisedPath::new("/")).as_str(), "/auth");
        assert_eq!(NormalisedPath::new("/").join(&base).as_str(), "/auth");
    }

    #[test]
    fn starts_with_respects_segment_boundaries() {
        let base = NormalisedPath::new("/auth");
        assert!(NormalisedPath::new("/auth").starts_with(&base));
        assert!(NormalisedPath::new("/auth/verify").starts_with(&base));
        assert!(!NormalisedPath::new("/authx").starts_with(&base));
        assert!(NormalisedPath::new("/anything").starts_with(&NormalisedPath::new("/")));
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(
            NormalisedPath::new("https://a.example/auth/"),
            NormalisedPath::new("/auth")
        );
        assert_ne!(NormalisedPath::new("/auth"), NormalisedPath::new("/auth/verify"));
    }
}
