//! The recipe registry: init-once composition root and route dispatch.
//!
//! [`AuthKit`] is the explicit context object: an ordered list of initialized
//! recipes plus the normalised app metadata, with a lazily built, memoized
//! path → candidate-screens table. It is a plain struct and can be
//! constructed directly (tests do). Application code normally goes through
//! the process-wide singleton facade ([`init`], [`instance_or_err`],
//! [`can_handle_route`], [`get_routing_component`]) because screens and
//! hooks need ambient access to the one configured instance.
//!
//! Resolution semantics for a queried location:
//! 1. look up the candidate list for the canonical path (miss means no
//!    recipe owns the path and the host's own routing takes over),
//! 2. first candidate whose predicate accepts the live location wins,
//! 3. otherwise the first registered candidate is the fallback, so
//!    registration order is the documented priority.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use dioxus::prelude::*;

use crate::config::{AppInfo, ConfigError, NormalisedAppInfo};
use crate::location::{current_location, has_browser_window, PageLocation};
use crate::path::NormalisedPath;
use crate::recipe::{FeatureComponentEntry, RecipeFactory, RecipeModule};

/// Errors from registry access (distinct from init-time [`ConfigError`]s).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The registry was used before [`init`] ran.
    #[error("{}", uninitialized_message(*.server_side))]
    Uninitialized { server_side: bool },

    /// A recipe id was looked up that no initialized recipe carries.
    #[error("Missing recipe: {0}")]
    MissingRecipe(String),
}

fn uninitialized_message(server_side: bool) -> String {
    let mut message = String::from("dxauthkit must be initialized before calling this method.");
    if server_side {
        message.push_str(
            "\nIf this code runs during server-side rendering, move the call into an \
             effect so it only executes in the browser.",
        );
    }
    message
}

/// Everything [`init`] needs: app metadata plus the ordered recipe factories.
pub struct AuthKitConfig {
    pub app_info: AppInfo,
    pub recipe_list: Vec<RecipeFactory>,
}

impl AuthKitConfig {
    pub fn new(app_info: AppInfo, recipe_list: Vec<RecipeFactory>) -> Self {
        AuthKitConfig {
            app_info,
            recipe_list,
        }
    }
}

/// The composition root: initialized recipes plus the merged routing table.
pub struct AuthKit {
    app_info: NormalisedAppInfo,
    recipes: Vec<Arc<dyn RecipeModule>>,
    route_table: RwLock<Option<HashMap<String, Vec<FeatureComponentEntry>>>>,
}

impl AuthKit {
    /// Validates the configuration and runs every recipe factory, in list
    /// order. Fails fast: an empty recipe list, malformed app metadata or a
    /// failing factory abort construction.
    pub fn new(config: AuthKitConfig) -> Result<Self, ConfigError> {
        if config.recipe_list.is_empty() {
            return Err(ConfigError::EmptyRecipeList);
        }
        let app_info = NormalisedAppInfo::try_from(config.app_info)?;

        let mut recipes: Vec<Arc<dyn RecipeModule>> = Vec::with_capacity(config.recipe_list.len());
        for factory in config.recipe_list {
            let recipe = factory(&app_info)?;
            tracing::trace!(recipe = recipe.recipe_id(), "recipe initialized");
            recipes.push(recipe);
        }

        Ok(AuthKit {
            app_info,
            recipes,
            route_table: RwLock::new(None),
        })
    }

    pub fn app_info(&self) -> &NormalisedAppInfo {
        &self.app_info
    }

    /// Initialized recipes in registration order.
    pub fn recipes(&self) -> &[Arc<dyn RecipeModule>] {
        &self.recipes
    }

    /// Every registered feature path, in first-registration order, without
    /// duplicates. Router adapters splice one route per path.
    pub fn feature_paths(&self) -> Vec<NormalisedPath> {
        let mut paths: Vec<NormalisedPath> = Vec::new();
        for recipe in &self.recipes {
            for entry in recipe.features() {
                if !paths.contains(&entry.path) {
                    paths.push(entry.path);
                }
            }
        }
        paths
    }

    /// The entry that owns `location`, if any.
    ///
    /// The candidate table is built on the first query and reused for the
    /// registry's whole lifetime; recipes must not change their feature set
    /// after init (only a full reset rebuilds).
    pub fn matching_entry_for(&self, location: &PageLocation) -> Option<FeatureComponentEntry> {
        self.with_route_table(|table| {
            let candidates = table.get(location.path().as_str())?;
            candidates
                .iter()
                .find(|entry| (entry.matches)(location))
                .or_else(|| candidates.first())
                .cloned()
        })
    }

    /// Whether some registered screen owns `location`.
    pub fn can_handle(&self, location: &PageLocation) -> bool {
        self.matching_entry_for(location).is_some()
    }

    /// Renders the screen owning `location`. `None` means the host's own
    /// routing should take over; it is not an error.
    pub fn routing_component_for(&self, location: &PageLocation) -> Option<Element> {
        let entry = self.matching_entry_for(location)?;
        tracing::trace!(
            path = %entry.path,
            recipe = %entry.recipe_id,
            "rendering feature screen"
        );
        Some((entry.component)())
    }

    /// Finds an initialized recipe by id. Failing here is a composition bug
    /// (a recipe depends on another that was never passed to init), so the
    /// error is loud rather than an `Option`.
    pub fn recipe_or_err(&self, recipe_id: &str) -> Result<Arc<dyn RecipeModule>, RegistryError> {
        self.recipes
            .iter()
            .find(|recipe| recipe.recipe_id() == recipe_id)
            .cloned()
            .ok_or_else(|| RegistryError::MissingRecipe(recipe_id.to_string()))
    }

    fn with_route_table<T>(
        &self,
        f: impl FnOnce(&HashMap<String, Vec<FeatureComponentEntry>>) -> T,
    ) -> T {
        {
            let guard = self
                .route_table
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(table) = guard.as_ref() {
                return f(table);
            }
        }
        let mut guard = self
            .route_table
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let table = guard.get_or_insert_with(|| Self::build_route_table(&self.recipes));
        f(table)
    }

    fn build_route_table(
        recipes: &[Arc<dyn RecipeModule>],
    ) -> HashMap<String, Vec<FeatureComponentEntry>> {
        let mut table: HashMap<String, Vec<FeatureComponentEntry>> = HashMap::new();
        for recipe in recipes {
            for entry in recipe.features() {
                tracing::trace!(
                    path = %entry.path,
                    recipe = %entry.recipe_id,
                    "feature path registered"
                );
                table
                    .entry(entry.path.as_str().to_string())
                    .or_default()
                    .push(entry);
            }
        }
        table
    }
}

static INSTANCE: RwLock<Option<Arc<AuthKit>>> = RwLock::new(None);

/// Initializes the process-wide registry.
///
/// The first call wins; later calls log a warning and leave the existing
/// instance untouched, so accidental double initialization (hot reloads,
/// duplicated setup paths) is harmless.
///
/// # Errors
///
/// [`ConfigError`] when the recipe list is empty, the app metadata is
/// malformed, or a recipe factory rejects its configuration.
pub fn init(config: AuthKitConfig) -> Result<(), ConfigError> {
    {
        let slot = INSTANCE.read().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            tracing::warn!("dxauthkit was already initialized, ignoring the repeated init call");
            return Ok(());
        }
    }

    // Factories run user code; build before taking the write lock.
    let kit = Arc::new(AuthKit::new(config)?);

    let mut slot = INSTANCE.write().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        tracing::warn!("dxauthkit was already initialized, ignoring the repeated init call");
        return Ok(());
    }
    tracing::trace!("dxauthkit initialized");
    *slot = Some(kit);
    Ok(())
}

/// The initialized registry.
///
/// # Errors
///
/// [`RegistryError::Uninitialized`] before [`init`]; when no browser window
/// exists the message points at server-side rendering, the usual culprit.
pub fn instance_or_err() -> Result<Arc<AuthKit>, RegistryError> {
    INSTANCE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .cloned()
        .ok_or_else(|| RegistryError::Uninitialized {
            server_side: !has_browser_window(),
        })
}

/// Whether a registered screen owns the browser's current location.
///
/// Without a browser window (server side) this is `false`: there is no URL
/// to own.
pub fn can_handle_route() -> Result<bool, RegistryError> {
    let kit = instance_or_err()?;
    Ok(current_location()
        .map(|location| kit.can_handle(&location))
        .unwrap_or(false))
}

/// Renders the screen owning the browser's current location, or `None` when
/// the host's own routing should handle it.
pub fn get_routing_component() -> Result<Option<Element>, RegistryError> {
    let kit = instance_or_err()?;
    Ok(current_location().and_then(|location| kit.routing_component_for(&location)))
}

/// Looks up an initialized recipe on the process-wide instance.
pub fn get_recipe_or_err(recipe_id: &str) -> Result<Arc<dyn RecipeModule>, RegistryError> {
    instance_or_err()?.recipe_or_err(recipe_id)
}

/// Clears the singleton and the router flavor memo so tests can
/// re-initialize from scratch. Compiled only for tests and the
/// `test-support` feature.
#[cfg(any(test, feature = "test-support"))]
pub fn reset() {
    *INSTANCE.write().unwrap_or_else(PoisonError::into_inner) = None;
    crate::router::reset_flavor();
    tracing::trace!("dxauthkit reset");
}

/// Serializes tests that touch the process-wide singleton.
#[cfg(any(test, feature = "test-support"))]
pub fn test_guard() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    fn blank() -> Element {
        VNode::empty()
    }

    fn entry(path: &str, recipe_id: &str, matched: bool) -> FeatureComponentEntry {
        FeatureComponentEntry::new(NormalisedPath::new(path), recipe_id, move |_| matched, blank)
    }

    struct StubRecipe {
        id: &'static str,
        features: Vec<FeatureComponentEntry>,
    }

    impl RecipeModule for StubRecipe {
        fn recipe_id(&self) -> &'static str {
            self.id
        }

        fn features(&self) -> Vec<FeatureComponentEntry> {
            self.features.clone()
        }

        fn as_any_arc(self: Arc<Self>) -> Arc<dyn std::any::Any + Send + Sync> {
            self
        }
    }

    fn factory(id: &'static str, features: Vec<FeatureComponentEntry>) -> RecipeFactory {
        Box::new(move |_| Ok(Arc::new(StubRecipe { id, features }) as Arc<dyn RecipeModule>))
    }

    fn app_info() -> AppInfo {
        AppInfo::new("Test App", "https://api.example.com", "https://example.com")
    }

    fn kit(recipes: Vec<RecipeFactory>) -> AuthKit {
        AuthKit::new(AuthKitConfig::new(app_info(), recipes)).unwrap()
    }

    #[test]
    fn preserves_recipe_count_and_order() {
        let kit = kit(vec![
            factory("first", vec![]),
            factory("second", vec![]),
            factory("third", vec![]),
        ]);
        let ids: Vec<&str> = kit.recipes().iter().map(|r| r.recipe_id()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn empty_recipe_list_is_rejected() {
        let result = AuthKit::new(AuthKitConfig::new(app_info(), vec![]));
        assert!(matches!(result, Err(ConfigError::EmptyRecipeList)));
    }

    #[test]
    fn malformed_app_info_is_rejected() {
        let mut info = app_info();
        info.api_domain = String::new();
        let result = AuthKit::new(AuthKitConfig::new(info, vec![factory("only", vec![])]));
        assert!(matches!(result, Err(ConfigError::MissingField { .. })));
    }

    #[test]
    fn single_true_candidate_resolves() {
        let kit = kit(vec![factory("solo", vec![entry("/auth", "solo", true)])]);
        let resolved = kit.matching_entry_for(&PageLocation::from_path("/auth")).unwrap();
        assert_eq!(resolved.recipe_id, "solo");
        assert!(kit.can_handle(&PageLocation::from_path("/auth")));
    }

    #[test]
    fn predicate_beats_registration_order() {
        let kit = kit(vec![
            factory("first", vec![entry("/auth", "first", false)]),
            factory("second", vec![entry("/auth", "second", true)]),
        ]);
        let resolved = kit.matching_entry_for(&PageLocation::from_path("/auth")).unwrap();
        assert_eq!(resolved.recipe_id, "second");
    }

    #[test]
    fn all_false_predicates_fall_back_to_first_registered() {
        let kit = kit(vec![
            factory("first", vec![entry("/auth", "first", false)]),
            factory("second", vec![entry("/auth", "second", false)]),
        ]);
        let resolved = kit.matching_entry_for(&PageLocation::from_path("/auth")).unwrap();
        assert_eq!(resolved.recipe_id, "first");
    }

    #[test]
    fn unregistered_path_resolves_to_nothing() {
        let kit = kit(vec![factory("solo", vec![entry("/auth", "solo", true)])]);
        let location = PageLocation::from_path("/dashboard");
        assert!(kit.matching_entry_for(&location).is_none());
        assert!(!kit.can_handle(&location));
        assert!(kit.routing_component_for(&location).is_none());
    }

    #[test]
    fn provider_callback_predicate_wins_across_recipes() {
        // Two recipes claim /auth/callback/github; the one whose predicate
        // inspects the provider segment wins even though it registered last.
        let rid_gated = FeatureComponentEntry::new(
            NormalisedPath::new("/auth/callback/github"),
            "generic",
            |location| location.query_param("rid") == Some("generic"),
            blank,
        );
        let provider_gated = FeatureComponentEntry::new(
            NormalisedPath::new("/auth/callback/github"),
            "github-aware",
            |location| location.last_segment() == Some("github"),
            blank,
        );
        let kit = kit(vec![
            factory("generic", vec![rid_gated]),
            factory("github-aware", vec![provider_gated]),
        ]);
        let resolved = kit
            .matching_entry_for(&PageLocation::from_path("/auth/callback/github"))
            .unwrap();
        assert_eq!(resolved.recipe_id, "github-aware");
    }

    #[test]
    fn route_table_is_built_once_and_memoized() {
        struct SwitchingRecipe {
            flipped: Arc<AtomicBool>,
        }

        impl RecipeModule for SwitchingRecipe {
            fn recipe_id(&self) -> &'static str {
                "switching"
            }

            fn features(&self) -> Vec<FeatureComponentEntry> {
                if self.flipped.load(Ordering::SeqCst) {
                    vec![]
                } else {
                    vec![entry("/auth", "switching", true)]
                }
            }

            fn as_any_arc(self: Arc<Self>) -> Arc<dyn std::any::Any + Send + Sync> {
                self
            }
        }

        let flipped = Arc::new(AtomicBool::new(false));
        let flip_handle = flipped.clone();
        let kit = kit(vec![Box::new(move |_| {
            Ok(Arc::new(SwitchingRecipe { flipped }) as Arc<dyn RecipeModule>)
        })]);

        let location = PageLocation::from_path("/auth");
        assert!(kit.matching_entry_for(&location).is_some());

        // The recipe now reports no features, but the first query already
        // compiled the table.
        flip_handle.store(true, Ordering::SeqCst);
        assert!(kit.matching_entry_for(&location).is_some());
    }

    #[test]
    fn feature_paths_keep_first_registration_order_and_dedupe() {
        let kit = kit(vec![
            factory(
                "first",
                vec![entry("/auth", "first", false), entry("/auth/verify", "first", false)],
            ),
            factory(
                "second",
                vec![entry("/auth", "second", false), entry("/auth/reset", "second", false)],
            ),
        ]);
        let feature_paths = kit.feature_paths();
        let paths: Vec<&str> = feature_paths.iter().map(|p| p.as_str()).collect();
        assert_eq!(paths, vec!["/auth", "/auth/verify", "/auth/reset"]);
    }

    #[test]
    fn recipe_lookup_by_id() {
        let kit = kit(vec![factory("present", vec![])]);
        assert_eq!(kit.recipe_or_err("present").unwrap().recipe_id(), "present");

        let error = kit.recipe_or_err("absent").err().unwrap();
        assert_eq!(error.to_string(), "Missing recipe: absent");
    }

    #[test]
    fn uninitialized_access_fails_with_ssr_hint() {
        let _guard = test_guard();
        reset();

        let error = instance_or_err().err().unwrap();
        let message = error.to_string();
        assert!(message.contains("must be initialized"));
        // Native test builds have no browser window, so the hint applies.
        assert!(message.contains("server-side rendering"));

        assert!(can_handle_route().is_err());
        assert!(get_routing_component().is_err());
    }

    #[test]
    fn double_init_keeps_the_first_instance() {
        let _guard = test_guard();
        reset();

        init(AuthKitConfig::new(app_info(), vec![factory("first", vec![])])).unwrap();
        init(AuthKitConfig::new(app_info(), vec![factory("second", vec![])])).unwrap();

        let kit = instance_or_err().unwrap();
        assert_eq!(kit.recipes().len(), 1);
        assert_eq!(kit.recipes()[0].recipe_id(), "first");

        reset();
        assert!(instance_or_err().is_err());
    }

    #[test]
    fn failed_init_leaves_the_registry_uninitialized() {
        let _guard = test_guard();
        reset();

        let result = init(AuthKitConfig::new(app_info(), vec![]));
        assert!(matches!(result, Err(ConfigError::EmptyRecipeList)));
        assert!(instance_or_err().is_err());
    }

    #[test]
    fn no_window_means_no_route_to_handle() {
        let _guard = test_guard();
        reset();

        init(AuthKitConfig::new(
            app_info(),
            vec![factory("solo", vec![entry("/auth", "solo", true)])],
        ))
        .unwrap();

        // Native targets have no location to inspect.
        assert_eq!(can_handle_route().unwrap(), false);
        assert!(get_routing_component().unwrap().is_none());
        assert_eq!(
            get_recipe_or_err("solo").unwrap().recipe_id(),
            "solo"
        );

        reset();
    }
}
