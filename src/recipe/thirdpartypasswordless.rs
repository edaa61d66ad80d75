//! Combined third-party + passwordless authentication recipe.
//!
//! Composes [`ThirdPartyRecipe`] and [`PasswordlessRecipe`] behind a single
//! recipe id: one merged sign-in/up screen at the website base path, with the
//! constituents' callback and magic-link routes carried over. Every route it
//! contributes is re-tagged with this recipe's id so route resolution treats
//! the combination as one method.

use std::any::Any;
use std::sync::Arc;

use dioxus::prelude::*;

use crate::config::{ConfigError, NormalisedAppInfo};
use crate::recipe::passwordless::{ContactMethod, PasswordlessConfig, PasswordlessRecipe};
use crate::recipe::thirdparty::{ThirdPartyConfig, ThirdPartyRecipe};
use crate::recipe::{
    passwordless, recipe_instance, rid_matches, thirdparty, FeatureComponentEntry, FeatureShell,
    RecipeFactory, RecipeModule,
};

/// Recipe identifier.
pub const RECIPE_ID: &str = "thirdpartypasswordless";

/// Configuration for [`ThirdPartyPasswordlessRecipe::init`].
#[derive(Debug, Clone)]
pub struct ThirdPartyPasswordlessConfig {
    /// Provider ids to offer alongside passwordless sign-in.
    pub providers: Vec<String>,
    pub contact_method: ContactMethod,
    /// Send an already signed-in visitor through success redirection instead
    /// of showing the sign-in form again. On by default.
    pub redirect_on_session_exists: bool,
}

impl ThirdPartyPasswordlessConfig {
    pub fn new(providers: &[&str], contact_method: ContactMethod) -> Self {
        ThirdPartyPasswordlessConfig {
            providers: providers.iter().map(|p| p.to_string()).collect(),
            contact_method,
            redirect_on_session_exists: true,
        }
    }
}

/// Third-party OAuth and passwordless sign-in offered side by side.
pub struct ThirdPartyPasswordlessRecipe {
    app_info: NormalisedAppInfo,
    config: ThirdPartyPasswordlessConfig,
    third_party: Arc<ThirdPartyRecipe>,
    passwordless: Arc<PasswordlessRecipe>,
}

impl ThirdPartyPasswordlessRecipe {
    /// Recipe factory for the init recipe list.
    ///
    /// # Errors
    ///
    /// The factory fails with [`ConfigError::EmptyProviderList`] when no
    /// providers were configured.
    pub fn init(config: ThirdPartyPasswordlessConfig) -> RecipeFactory {
        Box::new(move |app_info| {
            Ok(Self::from_parts(app_info, config)? as Arc<dyn RecipeModule>)
        })
    }

    pub(crate) fn from_parts(
        app_info: &NormalisedAppInfo,
        config: ThirdPartyPasswordlessConfig,
    ) -> Result<Arc<Self>, ConfigError> {
        let third_party = ThirdPartyRecipe::from_parts(
            app_info,
            ThirdPartyConfig {
                providers: config.providers.clone(),
                redirect_on_session_exists: config.redirect_on_session_exists,
            },
        )?;
        let passwordless = PasswordlessRecipe::from_parts(
            app_info,
            PasswordlessConfig {
                contact_method: config.contact_method,
                redirect_on_session_exists: config.redirect_on_session_exists,
            },
        );

        Ok(Arc::new(ThirdPartyPasswordlessRecipe {
            app_info: app_info.clone(),
            config,
            third_party,
            passwordless,
        }))
    }

    /// The initialized recipe, resolved through the registry.
    pub fn instance() -> Option<Arc<Self>> {
        recipe_instance(RECIPE_ID)
    }

    pub fn config(&self) -> &ThirdPartyPasswordlessConfig {
        &self.config
    }
}

impl RecipeModule for ThirdPartyPasswordlessRecipe {
    fn recipe_id(&self) -> &'static str {
        RECIPE_ID
    }

    fn features(&self) -> Vec<FeatureComponentEntry> {
        let base = self.app_info.website_base_path.clone();
        // One merged sign-in screen replaces the constituents' base entries.
        // It answers to this recipe's rid as well as either constituent's,
        // since backends may redirect with the narrower id.
        let mut entries = vec![FeatureComponentEntry::new(
            base.clone(),
            RECIPE_ID,
            |location| {
                rid_matches(location, RECIPE_ID)
                    || rid_matches(location, thirdparty::RECIPE_ID)
                    || rid_matches(location, passwordless::RECIPE_ID)
            },
            sign_in_up_screen,
        )];
        for entry in self
            .third_party
            .features()
            .into_iter()
            .chain(self.passwordless.features())
        {
            if entry.path != base {
                entries.push(retag(entry));
            }
        }
        entries
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Carries a constituent entry over under this recipe's id, widening its
/// predicate to also accept the combined rid.
fn retag(entry: FeatureComponentEntry) -> FeatureComponentEntry {
    let inner = entry.matches.clone();
    FeatureComponentEntry {
        path: entry.path,
        recipe_id: RECIPE_ID.to_string(),
        matches: Arc::new(move |location| rid_matches(location, RECIPE_ID) || inner(location)),
        component: entry.component,
    }
}

fn sign_in_up_screen() -> Element {
    let redirect_on_session_exists = ThirdPartyPasswordlessRecipe::instance()
        .map(|recipe| recipe.config().redirect_on_session_exists)
        .unwrap_or(true);
    rsx! {
        FeatureShell {
            recipe_id: RECIPE_ID,
            screen_class: "dxauthkit-thirdpartypasswordless-signinup",
            redirect_on_session_exists,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppInfo;
    use crate::location::PageLocation;

    fn app_info() -> NormalisedAppInfo {
        NormalisedAppInfo::try_from(AppInfo::new(
            "Test App",
            "https://api.example.com",
            "https://example.com",
        ))
        .unwrap()
    }

    fn build() -> Arc<dyn RecipeModule> {
        ThirdPartyPasswordlessRecipe::init(ThirdPartyPasswordlessConfig::new(
            &["github"],
            ContactMethod::Email,
        ))(&app_info())
        .unwrap()
    }

    #[test]
    fn merges_constituent_routes_under_one_id() {
        let recipe = build();
        let features = recipe.features();
        let paths: Vec<String> = features
            .iter()
            .map(|entry| entry.path.as_str().to_string())
            .collect();
        assert_eq!(
            paths,
            vec!["/auth", "/auth/callback/github", "/auth/verify"]
        );
        assert!(features.iter().all(|e| e.recipe_id == RECIPE_ID));
    }

    #[test]
    fn base_entry_answers_to_all_three_rids() {
        let recipe = build();
        let base = &recipe.features()[0];
        for rid in ["thirdpartypasswordless", "thirdparty", "passwordless"] {
            assert!((base.matches)(&PageLocation::with_query("/auth", &[("rid", rid)])));
        }
        assert!(!(base.matches)(&PageLocation::with_query(
            "/auth",
            &[("rid", "emailpassword")]
        )));
    }

    #[test]
    fn carried_over_routes_keep_their_own_matching() {
        let recipe = build();
        let features = recipe.features();
        let callback = &features[1];
        assert!((callback.matches)(&PageLocation::from_path(
            "/auth/callback/github"
        )));
        assert!(!(callback.matches)(&PageLocation::from_path(
            "/auth/callback/gitlab"
        )));

        let verify = &features[2];
        assert!((verify.matches)(&PageLocation::with_query(
            "/auth/verify",
            &[("preAuthSessionId", "abc123")]
        )));
        assert!((verify.matches)(&PageLocation::with_query(
            "/auth/verify",
            &[("rid", "thirdpartypasswordless")]
        )));
    }

    #[test]
    fn empty_provider_list_fails_at_init() {
        let result = ThirdPartyPasswordlessRecipe::init(ThirdPartyPasswordlessConfig::new(
            &[],
            ContactMethod::Email,
        ))(&app_info());
        assert!(matches!(result, Err(ConfigError::EmptyProviderList)));
    }
}
