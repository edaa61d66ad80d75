//! Session management recipe: the crate's view of "who is signed in".
//!
//! Session state lives in backend-managed cookies; this recipe is an async
//! facade over the backend's session endpoint. It contributes no screens of
//! its own. Pre-built screens, the session context provider and the
//! [`SessionAuth`](crate::hooks::SessionAuth) guard all consult it, and the
//! transport sits behind the [`SessionApi`] trait so tests and non-browser
//! hosts can script session state.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::claims::{validate_claims, ClaimValidationError, SessionClaimValidator};
use crate::config::NormalisedAppInfo;
use crate::path::NormalisedPath;
use crate::recipe::{FeatureComponentEntry, RecipeFactory, RecipeModule};
use crate::registry::RegistryError;
use crate::router::history::redirect_browser;

/// Recipe identifier.
pub const RECIPE_ID: &str = "session";

/// Query parameter a guard uses to remember where the user was headed
/// before being sent to the auth screens.
pub const REDIRECT_TO_PATH_QUERY_PARAM: &str = "redirectToPath";

/// Response header carrying the session's public token. Takes precedence
/// over the response body when present.
const FRONT_TOKEN_HEADER: &str = "front-token";

/// Errors from the session facade.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// The session endpoint could not be reached.
    #[error("session request failed: {0}")]
    Network(String),

    /// The session endpoint answered with something other than a session or
    /// a clean "no session".
    #[error("session endpoint returned unexpected status {0}")]
    UnexpectedStatus(u16),

    /// The session response could not be decoded.
    #[error("session payload could not be parsed: {0}")]
    InvalidPayload(String),

    /// A method that needs a session ran without one.
    #[error("no active session")]
    NoSession,

    /// Global claim validation rejected the session.
    #[error("session claims failed validation ({} failing)", .0.len())]
    InvalidClaims(Vec<ClaimValidationError>),
}

/// What the backend reports about the current session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub user_id: String,
    #[serde(default)]
    pub access_token_payload: Value,
}

/// Transport seam for the session endpoint.
///
/// `Ok(None)` means "no session" and is normal; errors are transport or
/// decoding failures. Futures are not required to be `Send`: on wasm the
/// fetch-backed future never is.
#[async_trait(?Send)]
pub trait SessionApi: Send + Sync {
    async fn fetch_session(&self) -> Result<Option<SessionSnapshot>, SessionError>;
}

/// Default [`SessionApi`]: `GET {apiDomain}{apiBasePath}/session` with the
/// `rid` header the backend dispatches on.
pub struct HttpSessionApi {
    session_url: String,
}

impl HttpSessionApi {
    pub fn new(app_info: &NormalisedAppInfo) -> Self {
        HttpSessionApi {
            session_url: app_info.api_url(&NormalisedPath::new("/session")),
        }
    }
}

#[async_trait(?Send)]
impl SessionApi for HttpSessionApi {
    async fn fetch_session(&self) -> Result<Option<SessionSnapshot>, SessionError> {
        // 1. Ask the backend about the cookie-bound session
        let client = reqwest::Client::new();
        let response = client
            .get(&self.session_url)
            .header("rid", RECIPE_ID)
            .send()
            .await
            .map_err(|error| SessionError::Network(error.to_string()))?;

        // 2. 401/403 is the backend's way of saying "no session"
        match response.status().as_u16() {
            200 => {}
            401 | 403 => {
                tracing::trace!("session endpoint reported no active session");
                return Ok(None);
            }
            other => return Err(SessionError::UnexpectedStatus(other)),
        }

        // 3. Prefer the front token header, fall back to the JSON body
        let front_token = response
            .headers()
            .get(FRONT_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        if let Some(token) = front_token {
            return decode_front_token(&token).map(Some);
        }
        let snapshot = response
            .json::<SessionSnapshot>()
            .await
            .map_err(|error| SessionError::InvalidPayload(error.to_string()))?;
        Ok(Some(snapshot))
    }
}

/// Decodes a front token: base64 JSON `{ "uid": ..., "up": ... }` exposing
/// the user id and the access token's public payload to the browser.
pub(crate) fn decode_front_token(raw: &str) -> Result<SessionSnapshot, SessionError> {
    #[derive(Deserialize)]
    struct FrontToken {
        uid: String,
        #[serde(default)]
        up: Value,
    }

    let trimmed = raw.trim();
    let bytes = STANDARD
        .decode(trimmed)
        .or_else(|_| URL_SAFE_NO_PAD.decode(trimmed))
        .map_err(|error| SessionError::InvalidPayload(format!("invalid base64: {error}")))?;
    let token: FrontToken = serde_json::from_slice(&bytes)
        .map_err(|error| SessionError::InvalidPayload(format!("invalid front token: {error}")))?;

    Ok(SessionSnapshot {
        user_id: token.uid,
        access_token_payload: token.up,
    })
}

/// Wire context describing why a redirect is happening. Serialized shape is
/// part of the public surface (hosts can intercept redirects).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectContext {
    pub rid: String,
    pub success_redirect_context: SuccessRedirectContext,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessRedirectContext {
    pub action: RedirectAction,
    pub is_new_recipe_user: bool,
    pub is_new_primary_user: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedirectAction {
    Success,
}

impl RedirectContext {
    /// A successful-auth context for `rid` with no user flags set.
    pub fn success(rid: &str) -> Self {
        RedirectContext {
            rid: rid.to_string(),
            success_redirect_context: SuccessRedirectContext {
                action: RedirectAction::Success,
                is_new_recipe_user: false,
                is_new_primary_user: false,
                redirect_to_path: None,
            },
        }
    }

    pub fn with_new_recipe_user(mut self, is_new: bool) -> Self {
        self.success_redirect_context.is_new_recipe_user = is_new;
        self
    }

    pub fn with_new_primary_user(mut self, is_new: bool) -> Self {
        self.success_redirect_context.is_new_primary_user = is_new;
        self
    }

    pub fn with_redirect_to_path(mut self, path: Option<String>) -> Self {
        self.success_redirect_context.redirect_to_path = path;
        self
    }
}

/// Configuration for [`SessionRecipe::init`].
#[derive(Default)]
pub struct SessionConfig {
    /// Claim checks applied to every fetched payload.
    pub validators: Vec<Arc<dyn SessionClaimValidator>>,
    /// Where successful auth lands when no `redirectToPath` was requested.
    /// Defaults to the website root.
    pub default_redirect_path: Option<String>,
    /// Transport override. Defaults to [`HttpSessionApi`].
    pub api: Option<Arc<dyn SessionApi>>,
}

impl SessionConfig {
    pub fn with_validator(mut self, validator: Arc<dyn SessionClaimValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn with_default_redirect_path(mut self, path: &str) -> Self {
        self.default_redirect_path = Some(path.to_string());
        self
    }

    pub fn with_api(mut self, api: Arc<dyn SessionApi>) -> Self {
        self.api = Some(api);
        self
    }
}

/// The session management recipe.
pub struct SessionRecipe {
    app_info: NormalisedAppInfo,
    api: Arc<dyn SessionApi>,
    validators: Vec<Arc<dyn SessionClaimValidator>>,
    default_redirect_path: NormalisedPath,
}

impl SessionRecipe {
    /// Recipe factory for the init recipe list.
    pub fn init(config: SessionConfig) -> RecipeFactory {
        Box::new(move |app_info| {
            let api = config
                .api
                .unwrap_or_else(|| Arc::new(HttpSessionApi::new(app_info)) as Arc<dyn SessionApi>);
            Ok(Arc::new(SessionRecipe {
                app_info: app_info.clone(),
                api,
                validators: config.validators,
                default_redirect_path: NormalisedPath::new(
                    config.default_redirect_path.as_deref().unwrap_or("/"),
                ),
            }) as Arc<dyn RecipeModule>)
        })
    }

    /// Factory with an empty configuration.
    pub fn init_default() -> RecipeFactory {
        Self::init(SessionConfig::default())
    }

    /// The initialized session recipe, resolved through the registry.
    ///
    /// # Errors
    ///
    /// Propagates [`RegistryError::Uninitialized`], or
    /// [`RegistryError::MissingRecipe`] when init ran without a session
    /// recipe in its list.
    pub fn instance_or_err() -> Result<Arc<SessionRecipe>, RegistryError> {
        let recipe = crate::registry::get_recipe_or_err(RECIPE_ID)?;
        recipe
            .as_any_arc()
            .downcast::<SessionRecipe>()
            .map_err(|_| RegistryError::MissingRecipe(RECIPE_ID.to_string()))
    }

    /// Like [`SessionRecipe::instance_or_err`] but quiet.
    pub fn instance() -> Option<Arc<SessionRecipe>> {
        Self::instance_or_err().ok()
    }

    pub fn app_info(&self) -> &NormalisedAppInfo {
        &self.app_info
    }

    /// One round trip to the session endpoint. Callers that need several
    /// facts about the session should take a snapshot instead of asking
    /// question by question.
    pub async fn snapshot(&self) -> Result<Option<SessionSnapshot>, SessionError> {
        self.api.fetch_session().await
    }

    /// Whether a session currently exists. Transport failures count as "no
    /// session" and are logged.
    pub async fn does_session_exist(&self) -> bool {
        match self.snapshot().await {
            Ok(snapshot) => snapshot.is_some(),
            Err(error) => {
                tracing::error!(%error, "session existence check failed");
                false
            }
        }
    }

    /// The signed-in user's id.
    pub async fn get_user_id(&self) -> Result<String, SessionError> {
        let snapshot = self.snapshot().await?.ok_or(SessionError::NoSession)?;
        Ok(snapshot.user_id)
    }

    /// The public part of the access token payload.
    pub async fn get_access_token_payload_securely(&self) -> Result<Value, SessionError> {
        let snapshot = self.snapshot().await?.ok_or(SessionError::NoSession)?;
        Ok(snapshot.access_token_payload)
    }

    /// Runs the configured validators against a payload, with no user
    /// context.
    pub fn validate_payload(&self, payload: &Value) -> Vec<ClaimValidationError> {
        validate_claims(payload, &Value::Null, &self.validators)
    }

    /// Fetches the current payload and runs the configured validators.
    /// No session or a transport failure yields no claim failures.
    pub async fn validate_claims(&self) -> Vec<ClaimValidationError> {
        match self.snapshot().await {
            Ok(Some(snapshot)) => self.validate_payload(&snapshot.access_token_payload),
            Ok(None) => Vec::new(),
            Err(error) => {
                tracing::error!(%error, "claim validation could not fetch the session");
                Vec::new()
            }
        }
    }

    /// Where a successful auth should land: the requested `redirectToPath`
    /// when present, the configured default otherwise.
    pub fn success_redirect_target(&self, context: &RedirectContext) -> String {
        match &context.success_redirect_context.redirect_to_path {
            Some(path) => NormalisedPath::new(path).as_str().to_string(),
            None => self.default_redirect_path.as_str().to_string(),
        }
    }

    /// Validates global claims and, when they pass, sends the browser to the
    /// post-auth destination.
    ///
    /// `user_context` is an opaque value handed through to the claim
    /// validators, for hosts whose custom validators need call-site data.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidClaims`] when a configured validator rejects
    /// the payload; the redirect is skipped so the failing screen stays up.
    pub async fn validate_global_claims_and_handle_success_redirection(
        &self,
        context: RedirectContext,
        access_token_payload: Value,
        user_context: Option<Value>,
    ) -> Result<(), SessionError> {
        let user_context = user_context.unwrap_or(Value::Null);
        let failures = validate_claims(&access_token_payload, &user_context, &self.validators);
        if !failures.is_empty() {
            tracing::warn!(
                failing = failures.len(),
                rid = %context.rid,
                "claims failed validation, skipping success redirect"
            );
            return Err(SessionError::InvalidClaims(failures));
        }

        let target = self.success_redirect_target(&context);
        tracing::trace!(rid = %context.rid, target = %target, "redirecting after successful auth");
        redirect_browser(&target);
        Ok(())
    }
}

impl RecipeModule for SessionRecipe {
    fn recipe_id(&self) -> &'static str {
        RECIPE_ID
    }

    // Session management owns no screens.
    fn features(&self) -> Vec<FeatureComponentEntry> {
        Vec::new()
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
