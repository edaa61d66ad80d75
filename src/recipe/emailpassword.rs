//! Email + password authentication recipe.

use std::any::Any;
use std::sync::Arc;

use dioxus::prelude::*;

use crate::config::NormalisedAppInfo;
use crate::path::NormalisedPath;
use crate::recipe::{
    recipe_instance, FeatureComponentEntry, FeatureShell, RecipeFactory, RecipeModule,
};

/// Recipe identifier.
pub const RECIPE_ID: &str = "emailpassword";

/// Configuration for [`EmailPasswordRecipe::init`].
#[derive(Debug, Clone)]
pub struct EmailPasswordConfig {
    /// Send an already signed-in visitor through success redirection instead
    /// of showing the sign-in form again. On by default.
    pub redirect_on_session_exists: bool,
}

impl Default for EmailPasswordConfig {
    fn default() -> Self {
        EmailPasswordConfig {
            redirect_on_session_exists: true,
        }
    }
}

/// Email + password sign-in/up with a password-reset flow.
///
/// Contributes the sign-in/up screen at the website base path and the
/// reset-password screen underneath it.
pub struct EmailPasswordRecipe {
    app_info: NormalisedAppInfo,
    config: EmailPasswordConfig,
}

impl EmailPasswordRecipe {
    /// Recipe factory for the init recipe list.
    pub fn init(config: EmailPasswordConfig) -> RecipeFactory {
        Box::new(move |app_info| Ok(Self::from_parts(app_info, config) as Arc<dyn RecipeModule>))
    }

    /// Factory with the default configuration.
    pub fn init_default() -> RecipeFactory {
        Self::init(EmailPasswordConfig::default())
    }

    pub(crate) fn from_parts(
        app_info: &NormalisedAppInfo,
        config: EmailPasswordConfig,
    ) -> Arc<Self> {
        Arc::new(EmailPasswordRecipe {
            app_info: app_info.clone(),
            config,
        })
    }

    /// The initialized recipe, resolved through the registry.
    pub fn instance() -> Option<Arc<Self>> {
        recipe_instance(RECIPE_ID)
    }

    pub fn config(&self) -> &EmailPasswordConfig {
        &self.config
    }

    fn base_path(&self) -> NormalisedPath {
        self.app_info.website_base_path.clone()
    }
}

impl RecipeModule for EmailPasswordRecipe {
    fn recipe_id(&self) -> &'static str {
        RECIPE_ID
    }

    fn features(&self) -> Vec<FeatureComponentEntry> {
        let base = self.base_path();
        vec![
            FeatureComponentEntry::for_rid(base.clone(), RECIPE_ID, sign_in_up_screen),
            FeatureComponentEntry::for_rid(
                base.join(&NormalisedPath::new("/reset-password")),
                RECIPE_ID,
                reset_password_screen,
            ),
        ]
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

fn sign_in_up_screen() -> Element {
    let redirect_on_session_exists = EmailPasswordRecipe::instance()
        .map(|recipe| recipe.config().redirect_on_session_exists)
        .unwrap_or(true);
    rsx! {
        FeatureShell {
            recipe_id: RECIPE_ID,
            screen_class: "dxauthkit-emailpassword-signinup",
            redirect_on_session_exists,
        }
    }
}

// Resetting a password is legitimate with a live session, so this screen
// never redirects away.
fn reset_password_screen() -> Element {
    rsx! {
        FeatureShell {
            recipe_id: RECIPE_ID,
            screen_class: "dxauthkit-emailpassword-resetpassword",
            redirect_on_session_exists: false,
        }
    }
}
