//! Passwordless (magic link / OTP) authentication recipe.

use std::any::Any;
use std::sync::Arc;

use dioxus::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::NormalisedAppInfo;
use crate::path::NormalisedPath;
use crate::recipe::{
    recipe_instance, rid_matches, FeatureComponentEntry, FeatureShell, RecipeFactory,
    RecipeModule,
};

/// Recipe identifier.
pub const RECIPE_ID: &str = "passwordless";

/// Query parameter carried by magic links to identify the login attempt.
pub const PRE_AUTH_SESSION_ID_QUERY_PARAM: &str = "preAuthSessionId";

/// How the user is contacted for their code or magic link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactMethod {
    Email,
    Phone,
    EmailOrPhone,
}

/// Configuration for [`PasswordlessRecipe::init`].
#[derive(Debug, Clone)]
pub struct PasswordlessConfig {
    pub contact_method: ContactMethod,
    /// Send an already signed-in visitor through success redirection instead
    /// of showing the sign-in form again. On by default.
    pub redirect_on_session_exists: bool,
}

impl PasswordlessConfig {
    /// The contact method has no sensible default, so it is required up front.
    pub fn new(contact_method: ContactMethod) -> Self {
        PasswordlessConfig {
            contact_method,
            redirect_on_session_exists: true,
        }
    }
}

/// Magic-link and one-time-code sign-in.
///
/// Contributes the sign-in/up screen at the website base path and the
/// link-clicked screen that consumes magic links under `/verify`.
pub struct PasswordlessRecipe {
    app_info: NormalisedAppInfo,
    config: PasswordlessConfig,
}

impl PasswordlessRecipe {
    /// Recipe factory for the init recipe list.
    pub fn init(config: PasswordlessConfig) -> RecipeFactory {
        Box::new(move |app_info| Ok(Self::from_parts(app_info, config) as Arc<dyn RecipeModule>))
    }

    pub(crate) fn from_parts(
        app_info: &NormalisedAppInfo,
        config: PasswordlessConfig,
    ) -> Arc<Self> {
        Arc::new(PasswordlessRecipe {
            app_info: app_info.clone(),
            config,
        })
    }

    /// The initialized recipe, resolved through the registry.
    pub fn instance() -> Option<Arc<Self>> {
        recipe_instance(RECIPE_ID)
    }

    pub fn config(&self) -> &PasswordlessConfig {
        &self.config
    }

    fn base_path(&self) -> NormalisedPath {
        self.app_info.website_base_path.clone()
    }
}

impl RecipeModule for PasswordlessRecipe {
    fn recipe_id(&self) -> &'static str {
        RECIPE_ID
    }

    fn features(&self) -> Vec<FeatureComponentEntry> {
        let base = self.base_path();
        vec![
            FeatureComponentEntry::for_rid(base.clone(), RECIPE_ID, sign_in_up_screen),
            // Magic links always carry preAuthSessionId, and older links may
            // omit the rid, so the verify screen matches on either.
            FeatureComponentEntry::new(
                base.join(&NormalisedPath::new("/verify")),
                RECIPE_ID,
                |location| {
                    rid_matches(location, RECIPE_ID)
                        || location
                            .query_param(PRE_AUTH_SESSION_ID_QUERY_PARAM)
                            .is_some()
                },
                link_clicked_screen,
            ),
        ]
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

fn sign_in_up_screen() -> Element {
    let redirect_on_session_exists = PasswordlessRecipe::instance()
        .map(|recipe| recipe.config().redirect_on_session_exists)
        .unwrap_or(true);
    rsx! {
        FeatureShell {
            recipe_id: RECIPE_ID,
            screen_class: "dxauthkit-passwordless-signinup",
            redirect_on_session_exists,
        }
    }
}

// The link-clicked screen must consume the code even when a session already
// exists, so it never redirects away.
fn link_clicked_screen() -> Element {
    rsx! {
        FeatureShell {
            recipe_id: RECIPE_ID,
            screen_class: "dxauthkit-passwordless-linkclicked",
            redirect_on_session_exists: false,
        }
    }
}
