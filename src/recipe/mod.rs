//! The recipe seam: auth methods plug into the registry through this module.
//!
//! A recipe is one initialized authentication method (email+password,
//! passwordless, third-party providers, session management, or a
//! combination). Each recipe contributes [`FeatureComponentEntry`] values:
//! a canonical path, the owning recipe id, a dispatch-time match predicate,
//! and the pre-built screen for that path. The registry merges entries from
//! all recipes into one routing table.
//!
//! Predicates run lazily against the live [`PageLocation`] because the
//! deciding information (the `rid` query hint, a callback's provider) only
//! exists at navigation time, not at registration time.

pub mod emailpassword;
pub mod passwordless;
pub mod session;
pub mod thirdparty;
pub mod thirdpartypasswordless;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use dioxus::prelude::*;

use crate::config::{ConfigError, NormalisedAppInfo};
use crate::location::PageLocation;
use crate::path::NormalisedPath;
use crate::recipe::session::{RedirectContext, SessionRecipe, REDIRECT_TO_PATH_QUERY_PARAM};

/// Query parameter carrying the recipe hint on paths shared by several
/// recipes, e.g. `/auth?rid=thirdparty`.
pub const RECIPE_ID_QUERY_PARAM: &str = "rid";

/// A pre-built screen. Plain function components keep entries cheap to clone
/// and comparable in tests.
pub type FeatureComponent = fn() -> Element;

/// Dispatch-time predicate deciding whether an entry claims the location.
pub type MatchPredicate = Arc<dyn Fn(&PageLocation) -> bool + Send + Sync>;

/// Deferred recipe construction. Factories run once, in list order, during
/// init; a factory may reject its own configuration.
pub type RecipeFactory =
    Box<dyn FnOnce(&NormalisedAppInfo) -> Result<Arc<dyn RecipeModule>, ConfigError> + Send>;

/// One candidate screen for one path.
///
/// Several entries may share a path; the registry resolves between them per
/// navigation (predicate first, then registration order).
#[derive(Clone)]
pub struct FeatureComponentEntry {
    pub path: NormalisedPath,
    pub recipe_id: String,
    pub matches: MatchPredicate,
    pub component: FeatureComponent,
}

impl FeatureComponentEntry {
    /// Builds an entry with an arbitrary predicate.
    pub fn new(
        path: NormalisedPath,
        recipe_id: &str,
        matches: impl Fn(&PageLocation) -> bool + Send + Sync + 'static,
        component: FeatureComponent,
    ) -> Self {
        FeatureComponentEntry {
            path,
            recipe_id: recipe_id.to_string(),
            matches: Arc::new(matches),
            component,
        }
    }

    /// Builds an entry whose predicate checks the `rid` query hint against
    /// the owning recipe id.
    pub fn for_rid(path: NormalisedPath, recipe_id: &'static str, component: FeatureComponent) -> Self {
        Self::new(
            path,
            recipe_id,
            move |location| rid_matches(location, recipe_id),
            component,
        )
    }
}

impl fmt::Debug for FeatureComponentEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureComponentEntry")
            .field("path", &self.path)
            .field("recipe_id", &self.recipe_id)
            .finish_non_exhaustive()
    }
}

/// Whether the location's `rid` query hint names `recipe_id`.
pub fn rid_matches(location: &PageLocation, recipe_id: &str) -> bool {
    location.query_param(RECIPE_ID_QUERY_PARAM) == Some(recipe_id)
}

/// An initialized authentication method plugged into the registry.
///
/// Instances are created once by their [`RecipeFactory`] during init and
/// live for the registry's lifetime.
pub trait RecipeModule: Send + Sync {
    /// Unique recipe identifier, e.g. `"emailpassword"`.
    fn recipe_id(&self) -> &'static str;

    /// Candidate screens contributed by this recipe, in priority order.
    fn features(&self) -> Vec<FeatureComponentEntry>;

    /// Typed access for cross-recipe composition.
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Looks up an initialized recipe by id and downcasts it to its concrete
/// type. `None` when the registry is not initialized, the recipe was not
/// registered, or the id belongs to a different type.
pub fn recipe_instance<R>(recipe_id: &str) -> Option<Arc<R>>
where
    R: RecipeModule + Send + Sync + 'static,
{
    let kit = crate::registry::instance_or_err().ok()?;
    let recipe = kit.recipe_or_err(recipe_id).ok()?;
    recipe.as_any_arc().downcast::<R>().ok()
}

/// Chrome shared by the pre-built screens.
///
/// Handles the one behavior every sign-in style screen carries: when a
/// session already exists on mount, the user is sent through success
/// redirection instead of being shown the auth form again. Recipes can opt
/// out per screen via `redirect_on_session_exists`.
#[component]
pub(crate) fn FeatureShell(
    recipe_id: &'static str,
    screen_class: &'static str,
    #[props(default = true)] redirect_on_session_exists: bool,
    #[props(default = VNode::empty())] children: Element,
) -> Element {
    use_effect(move || {
        if !redirect_on_session_exists {
            return;
        }
        spawn(async move {
            let Some(session) = SessionRecipe::instance() else {
                tracing::trace!("no session recipe initialized, skipping session probe");
                return;
            };
            if !session.does_session_exist().await {
                return;
            }
            let redirect_to_path = crate::location::current_location()
                .and_then(|l| l.query_param(REDIRECT_TO_PATH_QUERY_PARAM).map(str::to_string));
            let payload = session
                .get_access_token_payload_securely()
                .await
                .unwrap_or_default();
            let context = RedirectContext::success(recipe_id).with_redirect_to_path(redirect_to_path);
            if let Err(error) = session
                .validate_global_claims_and_handle_success_redirection(context, payload, None)
                .await
            {
                tracing::error!(%error, "redirecting an existing session failed");
            }
        });
    });

    rsx! {
        div { class: "dxauthkit-screen {screen_class}", {children} }
    }
}
