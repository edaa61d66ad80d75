//! Application configuration shared by every recipe.
//!
//! [`AppInfo`] is what the host application supplies: its name, where the
//! auth backend lives, and where the SPA itself is served. Initialization
//! validates and normalises it once into a [`NormalisedAppInfo`], which is
//! what recipes and the session layer actually consume. Validation is
//! strict and happens up front so a misconfigured app fails at startup, not
//! on the first navigation.
//!
//! Configuration can be provided either programmatically or from
//! compile-time environment variables (see [`AppInfo::from_env`]), following
//! the build-script `.env` convention.

use serde::{Deserialize, Serialize};

use crate::path::NormalisedPath;

/// Base path used for both the API and the website when none is configured.
pub const DEFAULT_BASE_PATH: &str = "/auth";

/// Errors produced while validating configuration at init time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `init` was called with no recipes at all.
    #[error("please provide at least one recipe to the dxauthkit init call")]
    EmptyRecipeList,

    /// The thirdparty recipe was configured without any providers.
    #[error("please provide at least one provider to the thirdparty recipe")]
    EmptyProviderList,

    /// A required `AppInfo` field was empty.
    #[error("appInfo.{field} must not be empty")]
    MissingField { field: &'static str },

    /// A domain field could not be interpreted as an origin.
    #[error("appInfo.{field} is not a valid domain: {value:?}")]
    InvalidDomain {
        field: &'static str,
        value: String,
    },
}

/// Host application metadata, as supplied by the caller.
///
/// # Fields
///
/// - `app_name`: human-readable application name, shown by pre-built screens
/// - `api_domain`: origin of the auth backend (e.g., "https://api.example.com")
/// - `website_domain`: origin the SPA is served from (e.g., "https://example.com")
/// - `api_base_path`: path the auth backend is mounted under (default "/auth")
/// - `website_base_path`: path the pre-built screens live under (default "/auth")
///
/// # Example
///
/// ```
/// use dxauthkit::AppInfo;
///
/// let app_info = AppInfo::new("My App", "https://api.example.com", "https://example.com")
///     .with_website_base_path("/account");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppInfo {
    /// Human-readable application name, shown by pre-built screens.
    pub app_name: String,

    /// Origin of the auth backend, e.g. "https://api.example.com".
    pub api_domain: String,

    /// Origin the SPA is served from, e.g. "https://example.com".
    pub website_domain: String,

    /// Path prefix the auth backend is mounted under. Defaults to "/auth".
    pub api_base_path: Option<String>,

    /// Path prefix the pre-built screens are served under. Defaults to "/auth".
    pub website_base_path: Option<String>,
}

impl AppInfo {
    /// Creates an `AppInfo` with default base paths.
    pub fn new(app_name: &str, api_domain: &str, website_domain: &str) -> Self {
        AppInfo {
            app_name: app_name.to_string(),
            api_domain: api_domain.to_string(),
            website_domain: website_domain.to_string(),
            api_base_path: None,
            website_base_path: None,
        }
    }

    /// Overrides the API base path.
    pub fn with_api_base_path(mut self, path: &str) -> Self {
        self.api_base_path = Some(path.to_string());
        self
    }

    /// Overrides the website base path.
    pub fn with_website_base_path(mut self, path: &str) -> Self {
        self.website_base_path = Some(path.to_string());
        self
    }

    /// Creates an `AppInfo` from compile-time environment variables.
    ///
    /// Reads `AUTHKIT_APP_NAME`, `AUTHKIT_API_DOMAIN` and
    /// `AUTHKIT_WEBSITE_DOMAIN` (all required), plus the optional
    /// `AUTHKIT_API_BASE_PATH` and `AUTHKIT_WEBSITE_BASE_PATH`. The build
    /// script loads these from `.env` / `.env.example` when present, so the
    /// values are baked in at compile time via `option_env!()`.
    ///
    /// # Returns
    ///
    /// `None` if any required variable was not set at compile time.
    pub fn from_env() -> Option<Self> {
        let app_name = option_env!("AUTHKIT_APP_NAME")?;
        let api_domain = option_env!("AUTHKIT_API_DOMAIN")?;
        let website_domain = option_env!("AUTHKIT_WEBSITE_DOMAIN")?;

        Some(AppInfo {
            app_name: app_name.to_string(),
            api_domain: api_domain.to_string(),
            website_domain: website_domain.to_string(),
            api_base_path: option_env!("AUTHKIT_API_BASE_PATH").map(str::to_string),
            website_base_path: option_env!("AUTHKIT_WEBSITE_BASE_PATH").map(str::to_string),
        })
    }

    /// Creates an `AppInfo` from compile-time environment variables.
    ///
    /// # Panics
    ///
    /// Panics with a setup hint if a required variable was not set at
    /// compile time. Use [`AppInfo::from_env`] to handle the absence
    /// gracefully.
    pub fn from_env_or_panic() -> Self {
        Self::from_env().expect(
            "Missing required environment variables.\n\
             Ensure AUTHKIT_APP_NAME, AUTHKIT_API_DOMAIN and AUTHKIT_WEBSITE_DOMAIN\n\
             are set in your environment or .env file at build time.",
        )
    }
}

/// Validated, normalised application metadata.
///
/// Produced once at init from an [`AppInfo`]; everything downstream reads
/// this form. Domains are origins without trailing slashes, base paths are
/// canonical [`NormalisedPath`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalisedAppInfo {
    pub app_name: String,
    pub api_domain: String,
    pub website_domain: String,
    pub api_base_path: NormalisedPath,
    pub website_base_path: NormalisedPath,
}

impl NormalisedAppInfo {
    /// Full URL for an API endpoint underneath the API base path.
    ///
    /// # Example
    ///
    /// ```
    /// use dxauthkit::{AppInfo, NormalisedAppInfo, NormalisedPath};
    ///
    /// let info = NormalisedAppInfo::try_from(
    ///     AppInfo::new("My App", "https://api.example.com", "https://example.com"),
    /// )
    /// .unwrap();
    /// assert_eq!(
    ///     info.api_url(&NormalisedPath::new("/session")),
    ///     "https://api.example.com/auth/session"
    /// );
    /// ```
    pub fn api_url(&self, path: &NormalisedPath) -> String {
        format!("{}{}", self.api_domain, self.api_base_path.join(path))
    }

    /// Full URL for a page underneath the website base path.
    pub fn website_url(&self, path: &NormalisedPath) -> String {
        format!("{}{}", self.website_domain, self.website_base_path.join(path))
    }
}

impl TryFrom<AppInfo> for NormalisedAppInfo {
    type Error = ConfigError;

    fn try_from(raw: AppInfo) -> Result<Self, Self::Error> {
        let app_name = raw.app_name.trim();
        if app_name.is_empty() {
            return Err(ConfigError::MissingField { field: "appName" });
        }

        let api_domain = normalise_domain("apiDomain", &raw.api_domain)?;
        let website_domain = normalise_domain("websiteDomain", &raw.website_domain)?;

        let api_base_path =
            NormalisedPath::new(raw.api_base_path.as_deref().unwrap_or(DEFAULT_BASE_PATH));
        let website_base_path =
            NormalisedPath::new(raw.website_base_path.as_deref().unwrap_or(DEFAULT_BASE_PATH));

        Ok(NormalisedAppInfo {
            app_name: app_name.to_string(),
            api_domain,
            website_domain,
            api_base_path,
            website_base_path,
        })
    }
}

/// Normalises a domain field into an origin string.
///
/// Accepts values with or without a scheme. When the scheme is missing it is
/// inferred: `http` for localhost and literal IP addresses, `https`
/// otherwise. Any path suffix and trailing slashes are dropped.
fn normalise_domain(field: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingField { field });
    }
    if trimmed.contains(char::is_whitespace) {
        return Err(ConfigError::InvalidDomain {
            field,
            value: raw.to_string(),
        });
    }

    let (scheme, host_and_path) = match trimmed.split_once("://") {
        Some((scheme, rest)) => {
            if scheme != "http" && scheme != "https" {
                return Err(ConfigError::InvalidDomain {
                    field,
                    value: raw.to_string(),
                });
            }
            (Some(scheme), rest)
        }
        None => (None, trimmed),
    };

    let host = host_and_path
        .split('/')
        .next()
        .unwrap_or("")
        .trim_end_matches('/');
    if host.is_empty() {
        return Err(ConfigError::InvalidDomain {
            field,
            value: raw.to_string(),
        });
    }

    let scheme = scheme.unwrap_or(if is_local_host(host) { "http" } else { "https" });
    Ok(format!("{scheme}://{host}"))
}

fn is_local_host(host: &str) -> bool {
    let name = host.split(':').next().unwrap_or(host);
    name == "localhost"
        || name == "127.0.0.1"
        || name == "0.0.0.0"
        || name.chars().all(|c| c.is_ascii_digit() || c == '.')
}
