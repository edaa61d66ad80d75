//! Third-party (OAuth provider) authentication recipe.

use std::any::Any;
use std::sync::Arc;

use dioxus::prelude::*;

use crate::config::{ConfigError, NormalisedAppInfo};
use crate::path::NormalisedPath;
use crate::recipe::{
    recipe_instance, FeatureComponentEntry, FeatureShell, RecipeFactory, RecipeModule,
};

/// Recipe identifier.
pub const RECIPE_ID: &str = "thirdparty";

/// Configuration for [`ThirdPartyRecipe::init`].
#[derive(Debug, Clone)]
pub struct ThirdPartyConfig {
    /// Provider ids to offer, e.g. "github" or "google". Each gets its own
    /// OAuth callback route.
    pub providers: Vec<String>,
    /// Send an already signed-in visitor through success redirection instead
    /// of showing the sign-in form again. On by default.
    pub redirect_on_session_exists: bool,
}

impl ThirdPartyConfig {
    pub fn new(providers: &[&str]) -> Self {
        ThirdPartyConfig {
            providers: providers.iter().map(|p| p.to_string()).collect(),
            redirect_on_session_exists: true,
        }
    }
}

/// OAuth sign-in through external providers.
///
/// Contributes the sign-in/up screen at the website base path and one
/// callback route per configured provider.
pub struct ThirdPartyRecipe {
    app_info: NormalisedAppInfo,
    config: ThirdPartyConfig,
}

impl ThirdPartyRecipe {
    /// Recipe factory for the init recipe list.
    ///
    /// # Errors
    ///
    /// The factory fails with [`ConfigError::EmptyProviderList`] when no
    /// providers were configured.
    pub fn init(config: ThirdPartyConfig) -> RecipeFactory {
        Box::new(move |app_info| {
            Ok(Self::from_parts(app_info, config)? as Arc<dyn RecipeModule>)
        })
    }

    pub(crate) fn from_parts(
        app_info: &NormalisedAppInfo,
        config: ThirdPartyConfig,
    ) -> Result<Arc<Self>, ConfigError> {
        if config.providers.is_empty() {
            return Err(ConfigError::EmptyProviderList);
        }
        Ok(Arc::new(ThirdPartyRecipe {
            app_info: app_info.clone(),
            config,
        }))
    }

    /// The initialized recipe, resolved through the registry.
    pub fn instance() -> Option<Arc<Self>> {
        recipe_instance(RECIPE_ID)
    }

    pub fn config(&self) -> &ThirdPartyConfig {
        &self.config
    }

    fn base_path(&self) -> NormalisedPath {
        self.app_info.website_base_path.clone()
    }
}

impl RecipeModule for ThirdPartyRecipe {
    fn recipe_id(&self) -> &'static str {
        RECIPE_ID
    }

    fn features(&self) -> Vec<FeatureComponentEntry> {
        let base = self.base_path();
        let mut entries = vec![FeatureComponentEntry::for_rid(
            base.clone(),
            RECIPE_ID,
            sign_in_up_screen,
        )];
        // OAuth providers redirect back without a rid, so each callback
        // route matches on its own trailing provider segment instead.
        for provider in &self.config.providers {
            let expected = provider.clone();
            entries.push(FeatureComponentEntry::new(
                base.join(&NormalisedPath::new(&format!("/callback/{provider}"))),
                RECIPE_ID,
                move |location| location.last_segment() == Some(expected.as_str()),
                callback_screen,
            ));
        }
        entries
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

fn sign_in_up_screen() -> Element {
    let redirect_on_session_exists = ThirdPartyRecipe::instance()
        .map(|recipe| recipe.config().redirect_on_session_exists)
        .unwrap_or(true);
    rsx! {
        FeatureShell {
            recipe_id: RECIPE_ID,
            screen_class: "dxauthkit-thirdparty-signinup",
            redirect_on_session_exists,
        }
    }
}

// The callback screen exchanges the authorization code; redirecting away
// before that completes would drop the sign-in.
fn callback_screen() -> Element {
    rsx! {
        FeatureShell {
            recipe_id: RECIPE_ID,
            screen_class: "dxauthkit-thirdparty-callback",
            redirect_on_session_exists: false,
        }
    }
}
