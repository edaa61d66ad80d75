//! Dioxus integration: session context, hooks and the route guard.
//!
//! [`AuthKitProvider`] hydrates the session state once after mount and shares
//! it through context. Components read it with [`use_session_context`], and
//! [`SessionAuth`] gates a subtree on a live session, bouncing signed-out
//! visitors to the auth page with a `redirectToPath` back-reference.

use dioxus::prelude::*;
use serde_json::Value;

use crate::claims::ClaimValidationError;
use crate::location::{current_location, PageLocation};
use crate::path::NormalisedPath;
use crate::recipe::session::{SessionRecipe, REDIRECT_TO_PATH_QUERY_PARAM};
use crate::router::history::redirect_browser;

/// Session state shared through context.
///
/// Starts in the loading state; [`AuthKitProvider`] replaces it once the
/// backend has been asked about the current session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContextValue {
    /// Still waiting for the first session check.
    pub loading: bool,
    pub does_session_exist: bool,
    pub user_id: Option<String>,
    pub access_token_payload: Value,
    /// Claim validators that rejected the current payload.
    pub invalid_claims: Vec<ClaimValidationError>,
}

impl Default for SessionContextValue {
    fn default() -> Self {
        SessionContextValue {
            loading: true,
            does_session_exist: false,
            user_id: None,
            access_token_payload: Value::Null,
            invalid_claims: Vec::new(),
        }
    }
}

impl SessionContextValue {
    /// Resolved state for a visitor without a session.
    pub fn signed_out() -> Self {
        SessionContextValue {
            loading: false,
            ..Self::default()
        }
    }
}

/// Context value installed by [`AuthKitProvider`].
#[derive(Clone, Copy)]
pub struct AuthKitContext {
    pub session: Signal<SessionContextValue>,
}

/// Provides session state to the component tree.
///
/// Mount it once, above the router, after `registry::init` has run:
///
/// ```rust,ignore
/// rsx! {
///     AuthKitProvider {
///         Router::<Route> {}
///     }
/// }
/// ```
#[component]
pub fn AuthKitProvider(children: Element) -> Element {
    let mut session = use_signal(SessionContextValue::default);
    use_context_provider(|| AuthKitContext { session });

    // 1. Hydrate once after mount; the signal stays in the loading state
    //    until the backend answers.
    use_effect(move || {
        spawn(async move {
            let Some(recipe) = SessionRecipe::instance() else {
                tracing::warn!(
                    "AuthKitProvider mounted without an initialized session recipe, \
                     treating the visitor as signed out"
                );
                session.set(SessionContextValue::signed_out());
                return;
            };

            // 2. One fetch resolves existence, the user id and the payload.
            match recipe.snapshot().await {
                Ok(Some(snapshot)) => {
                    let invalid_claims = recipe.validate_payload(&snapshot.access_token_payload);
                    session.set(SessionContextValue {
                        loading: false,
                        does_session_exist: true,
                        user_id: Some(snapshot.user_id),
                        access_token_payload: snapshot.access_token_payload,
                        invalid_claims,
                    });
                }
                Ok(None) => session.set(SessionContextValue::signed_out()),
                Err(err) => {
                    tracing::error!("session hydration failed: {err}");
                    session.set(SessionContextValue::signed_out());
                }
            }
        });
    });

    rsx! {
        {children}
    }
}

/// Reads the shared session state.
///
/// Outside an [`AuthKitProvider`] this logs a warning and returns a detached
/// signal that stays in the loading state, so callers degrade instead of
/// panicking.
pub fn use_session_context() -> Signal<SessionContextValue> {
    let fallback = use_signal(SessionContextValue::default);
    match try_consume_context::<AuthKitContext>() {
        Some(context) => context.session,
        None => {
            tracing::warn!(
                "use_session_context called without an AuthKitProvider ancestor, \
                 returning detached session state"
            );
            fallback
        }
    }
}

/// Renders its children only while a session exists.
///
/// While the first session check is in flight nothing is rendered. Once the
/// visitor is known to be signed out they are redirected to the auth page,
/// carrying the current location as `redirectToPath` so sign-in can return
/// them here.
#[component]
pub fn SessionAuth(children: Element) -> Element {
    let session = use_session_context();

    use_effect(move || {
        let state = session.read();
        if state.loading || state.does_session_exist {
            return;
        }
        match crate::registry::instance_or_err() {
            Ok(kit) => {
                let back_to = current_relative_url().unwrap_or_else(|| "/".to_string());
                redirect_browser(&auth_page_url(
                    &kit.app_info().website_base_path,
                    &back_to,
                ));
            }
            Err(err) => tracing::error!("cannot redirect to the auth page: {err}"),
        }
    });

    if session.read().does_session_exist {
        rsx! {
            {children}
        }
    } else {
        VNode::empty()
    }
}

/// Auth-page URL carrying the location to return to after sign-in.
fn auth_page_url(website_base_path: &NormalisedPath, redirect_to: &str) -> String {
    format!(
        "{}?{}={}",
        website_base_path,
        REDIRECT_TO_PATH_QUERY_PARAM,
        urlencoding::encode(redirect_to)
    )
}

fn relative_url(location: &PageLocation) -> String {
    let mut url = location.path().as_str().to_string();
    for (i, (name, value)) in location.query_pairs().iter().enumerate() {
        url.push(if i == 0 { '?' } else { '&' });
        url.push_str(&urlencoding::encode(name));
        url.push('=');
        url.push_str(&urlencoding::encode(value));
    }
    url
}

fn current_relative_url() -> Option<String> {
    current_location().map(|location| relative_url(&location))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_context_starts_loading() {
        let value = SessionContextValue::default();
        assert!(value.loading);
        assert!(!value.does_session_exist);
        assert_eq!(value.access_token_payload, Value::Null);
    }

    #[test]
    fn signed_out_is_resolved_and_empty() {
        let value = SessionContextValue::signed_out();
        assert!(!value.loading);
        assert!(!value.does_session_exist);
        assert!(value.user_id.is_none());
        assert!(value.invalid_claims.is_empty());
    }

    #[test]
    fn auth_page_url_escapes_the_return_location() {
        assert_eq!(
            auth_page_url(&NormalisedPath::new("/auth"), "/dashboard?tab=1"),
            "/auth?redirectToPath=%2Fdashboard%3Ftab%3D1"
        );
    }

    #[test]
    fn relative_url_rebuilds_path_and_query() {
        let location = PageLocation::with_query("/orders", &[("page", "2"), ("q", "a b")]);
        assert_eq!(relative_url(&location), "/orders?page=2&q=a%20b");
    }
}
