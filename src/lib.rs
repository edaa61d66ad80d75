//! # dxauthkit
//!
//! Pre-built authentication screens and session management for Dioxus
//! single-page applications.
//!
//! ## Overview
//!
//! `dxauthkit` is organised around *recipes*: self-contained authentication
//! methods (email+password, passwordless, third-party OAuth, and their
//! combination) that plug into one shared registry. The host application
//! initializes the registry once with its [`AppInfo`] and the recipes it
//! wants, and the crate takes over two concerns:
//!
//! - **Route dispatch** - every recipe contributes the paths it owns (the
//!   sign-in page, OAuth callbacks, magic-link verification). Given the
//!   browser's current location, the registry picks the screen to render,
//!   disambiguating shared paths through the `rid` query parameter.
//! - **Session state** - a session recipe talks to the auth backend,
//!   validates claims, and feeds the [`hooks::AuthKitProvider`] context that
//!   the rest of the app reads through [`hooks::use_session_context`] and
//!   guards with [`hooks::SessionAuth`].
//!
//! ## Usage Examples
//!
//! ### Initialization
//!
//! Initialize exactly once, before the first render:
//!
//! ```rust,ignore
//! use dxauthkit::{AppInfo, AuthKitConfig};
//! use dxauthkit::recipe::emailpassword::EmailPasswordRecipe;
//! use dxauthkit::recipe::session::SessionRecipe;
//!
//! fn main() {
//!     dxauthkit::registry::init(AuthKitConfig::new(
//!         AppInfo::new("My App", "https://api.example.com", "https://example.com"),
//!         vec![
//!             EmailPasswordRecipe::init_default(),
//!             SessionRecipe::init_default(),
//!         ],
//!     ))
//!     .expect("invalid dxauthkit configuration");
//!
//!     dioxus::launch(App);
//! }
//! ```
//!
//! Repeated `init` calls are ignored with a warning; the first configuration
//! wins. `AppInfo` can also come from compile-time environment variables via
//! [`AppInfo::from_env`], following the build-script `.env` convention.
//!
//! ### Rendering auth screens
//!
//! Mount the provider above your router and hand the auth subtree to the
//! registry:
//!
//! ```rust,ignore
//! use dxauthkit::hooks::{AuthKitProvider, SessionAuth};
//!
//! #[component]
//! fn App() -> Element {
//!     rsx! {
//!         AuthKitProvider {
//!             Router::<Route> {}
//!         }
//!     }
//! }
//!
//! // Catch-all under the website base path, e.g. /auth/:..segments
//! #[component]
//! fn AuthScreens() -> Element {
//!     match dxauthkit::registry::get_routing_component() {
//!         Ok(Some(screen)) => screen,
//!         _ => rsx! { PageNotFound {} },
//!     }
//! }
//!
//! // Anywhere else, gate protected pages on a live session.
//! #[component]
//! fn Dashboard() -> Element {
//!     rsx! {
//!         SessionAuth {
//!             DashboardBody {}
//!         }
//!     }
//! }
//! ```
//!
//! Applications that let `dxauthkit` drive navigation (instead of owning a
//! catch-all route) can enumerate [`router::auth_routes`] and navigate with
//! [`router::use_auth_navigator`], which adapts to the router generation it
//! detects.
//!
//! ## Architecture
//!
//! - [`path`] - canonical [`NormalisedPath`] used for all route comparison
//! - [`location`] - browser location snapshots ([`location::PageLocation`])
//! - [`config`] - [`AppInfo`] validation into [`NormalisedAppInfo`]
//! - [`claims`] - session claim validators
//! - [`recipe`] - the recipe seam plus the built-in recipes
//!   (`emailpassword`, `passwordless`, `thirdparty`, `thirdpartypasswordless`,
//!   `session`)
//! - [`registry`] - the init-once registry and route resolution
//! - [`router`] - router adapters, deferred navigation, auth route listings
//! - [`hooks`] - Dioxus context, hooks and the [`hooks::SessionAuth`] guard
//!
//! ## Platform Compatibility
//!
//! The crate targets WASM in the browser. It also compiles natively so
//! server-side rendering and ordinary `cargo test` work: on non-WASM targets
//! the browser bindings degrade (no current location, navigation logs a
//! warning) and registry errors mention server-side rendering where that is
//! the likely cause.

pub mod claims;
pub mod config;
pub mod hooks;
pub mod location;
pub mod path;
pub mod recipe;
pub mod registry;
pub mod router;

pub use config::{AppInfo, NormalisedAppInfo};
pub use path::NormalisedPath;
pub use registry::AuthKitConfig;
