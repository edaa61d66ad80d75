//! Host-router integration.
//!
//! The crate never owns routing. The host hands over a [`RoutingModule`];
//! this layer works out, once, which of two navigation styles that module
//! supports and adapts registry decisions to it:
//!
//! - **Legacy**: the module exposes a direct history handle, so navigation
//!   is a plain synchronous push.
//! - **Modern**: no history handle; the router owns scheduling, so
//!   navigation requests are queued and dispatched after commit (see
//!   [`deferred`]).
//!
//! [`auth_routes`] produces plain route definitions, one per registered
//! feature path, for splicing into the host's route tree.

pub mod deferred;
pub mod history;

use std::rc::Rc;
use std::sync::{PoisonError, RwLock};

use dioxus::prelude::*;

use crate::path::NormalisedPath;
use crate::registry::{self, RegistryError};

use self::deferred::{use_deferred_navigator, DeferredNavigator};
use self::history::{BrowserHistory, HistoryApi};

/// How the host's router wants navigation delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterFlavor {
    /// Direct history access, navigate synchronously.
    Legacy,
    /// Scheduler-owned, navigate after commit through the deferred queue.
    Modern,
}

/// The host's routing module as this crate sees it.
pub trait RoutingModule {
    /// The direct history handle, when the router exposes one. Returning
    /// `None` is how modern routers are recognized.
    fn history(&self) -> Option<Rc<dyn HistoryApi>> {
        None
    }

    /// The router's own navigation primitive.
    fn push(&self, to: String);
}

/// Built-in legacy module: navigates the browser directly.
#[derive(Default)]
pub struct BrowserHistoryRouter;

impl RoutingModule for BrowserHistoryRouter {
    fn history(&self) -> Option<Rc<dyn HistoryApi>> {
        Some(BrowserHistory::handle())
    }

    fn push(&self, to: String) {
        BrowserHistory.push(&to);
    }
}

/// Built-in modern module: wraps the navigate callback of a router that owns
/// its own scheduling.
pub struct CallbackRouter {
    navigate: Callback<String>,
}

impl CallbackRouter {
    pub fn new(navigate: Callback<String>) -> Self {
        CallbackRouter { navigate }
    }
}

impl RoutingModule for CallbackRouter {
    fn push(&self, to: String) {
        self.navigate.call(to);
    }
}

static FLAVOR: RwLock<Option<RouterFlavor>> = RwLock::new(None);

/// Detects `module`'s flavor by probing for the history capability.
///
/// The probe runs once per process: apps pass the same routing module on
/// every call, so the answer is memoized until a test reset.
pub fn router_flavor(module: &dyn RoutingModule) -> RouterFlavor {
    {
        let guard = FLAVOR.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(flavor) = *guard {
            return flavor;
        }
    }
    let flavor = if module.history().is_some() {
        RouterFlavor::Legacy
    } else {
        RouterFlavor::Modern
    };
    tracing::trace!(?flavor, "routing module flavor detected");
    *FLAVOR.write().unwrap_or_else(PoisonError::into_inner) = Some(flavor);
    flavor
}

#[cfg(any(test, feature = "test-support"))]
pub(crate) fn reset_flavor() {
    *FLAVOR.write().unwrap_or_else(PoisonError::into_inner) = None;
}

/// One route to splice into the host's route tree.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthRouteDef {
    pub path: NormalisedPath,
    pub component: fn() -> Element,
}

/// Route definitions for every registered feature path, in first-
/// registration order.
///
/// Each definition renders a resolver that re-derives the owning screen for
/// the live location, so a spliced route activates only for its own path
/// and applies predicates per navigation.
pub fn auth_routes(module: &dyn RoutingModule) -> Result<Vec<AuthRouteDef>, RegistryError> {
    collect_routes(module, None)
}

/// Like [`auth_routes`], restricted to the named recipes.
pub fn auth_routes_for_recipes(
    module: &dyn RoutingModule,
    recipe_ids: &[&str],
) -> Result<Vec<AuthRouteDef>, RegistryError> {
    collect_routes(module, Some(recipe_ids))
}

fn collect_routes(
    module: &dyn RoutingModule,
    filter: Option<&[&str]>,
) -> Result<Vec<AuthRouteDef>, RegistryError> {
    let kit = registry::instance_or_err()?;
    let flavor = router_flavor(module);

    let mut paths: Vec<NormalisedPath> = Vec::new();
    for recipe in kit.recipes() {
        if let Some(wanted) = filter {
            if !wanted.contains(&recipe.recipe_id()) {
                continue;
            }
        }
        for entry in recipe.features() {
            if !paths.contains(&entry.path) {
                paths.push(entry.path);
            }
        }
    }

    tracing::trace!(routes = paths.len(), ?flavor, "auth routes collected");
    Ok(paths
        .into_iter()
        .map(|path| AuthRouteDef {
            path,
            component: auth_route_screen,
        })
        .collect())
}

/// The screen spliced at each feature path. Resolves against the live
/// location; renders nothing when no recipe claims it.
fn auth_route_screen() -> Element {
    match registry::get_routing_component() {
        Ok(Some(screen)) => screen,
        Ok(None) => VNode::empty(),
        Err(error) => {
            tracing::error!(%error, "auth route rendered before initialization");
            VNode::empty()
        }
    }
}

/// Navigation handle honoring the detected flavor.
pub struct AuthNavigator {
    flavor: RouterFlavor,
    direct: Option<Rc<dyn HistoryApi>>,
    deferred: Option<DeferredNavigator>,
}

impl AuthNavigator {
    /// Navigates now (legacy) or right after commit (modern).
    pub fn navigate(&mut self, to: impl Into<String>) {
        let to = to.into();
        match (self.flavor, &self.direct, &mut self.deferred) {
            (RouterFlavor::Legacy, Some(history), _) => history.push(&to),
            (_, _, Some(deferred)) => deferred.push(to),
            _ => tracing::error!(target_path = %to, "no navigation capability available"),
        }
    }
}

/// Hook: builds an [`AuthNavigator`] wired to the supplied routing module.
pub fn use_auth_navigator(module: Rc<dyn RoutingModule>) -> AuthNavigator {
    let push_to_module = {
        let module = module.clone();
        use_callback(move |to: String| module.push(to))
    };
    // Hooks must run unconditionally; the legacy flavor just never drains it.
    let deferred = use_deferred_navigator(push_to_module);

    AuthNavigator {
        flavor: router_flavor(module.as_ref()),
        direct: module.history(),
        deferred: Some(deferred),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::sync::Arc;

    use super::*;
    use crate::config::AppInfo;
    use crate::recipe::{FeatureComponentEntry, RecipeFactory, RecipeModule};
    use crate::registry::{init, reset, test_guard, AuthKitConfig};

    #[derive(Default)]
    struct RecordingHistory {
        pushes: RefCell<Vec<String>>,
    }

    impl HistoryApi for RecordingHistory {
        fn push(&self, to: &str) {
            self.pushes.borrow_mut().push(to.to_string());
        }
    }

    struct LegacyStub {
        history: Rc<RecordingHistory>,
    }

    impl RoutingModule for LegacyStub {
        fn history(&self) -> Option<Rc<dyn HistoryApi>> {
            Some(self.history.clone())
        }

        fn push(&self, to: String) {
            self.history.push(&to);
        }
    }

    struct ModernStub;

    impl RoutingModule for ModernStub {
        fn push(&self, _to: String) {}
    }

    fn blank() -> Element {
        VNode::empty()
    }

    struct StubRecipe {
        id: &'static str,
        paths: Vec<&'static str>,
    }

    impl RecipeModule for StubRecipe {
        fn recipe_id(&self) -> &'static str {
            self.id
        }

        fn features(&self) -> Vec<FeatureComponentEntry> {
            self.paths
                .iter()
                .map(|path| {
                    FeatureComponentEntry::new(
                        NormalisedPath::new(path),
                        self.id,
                        |_| true,
                        blank,
                    )
                })
                .collect()
        }

        fn as_any_arc(self: std::sync::Arc<Self>) -> Arc<dyn std::any::Any + Send + Sync> {
            self
        }
    }

    fn stub_factory(id: &'static str, paths: Vec<&'static str>) -> RecipeFactory {
        Box::new(move |_| Ok(Arc::new(StubRecipe { id, paths }) as Arc<dyn RecipeModule>))
    }

    fn app_info() -> AppInfo {
        AppInfo::new("Test App", "https://api.example.com", "https://example.com")
    }

    #[test]
    fn history_capability_means_legacy() {
        let _guard = test_guard();
        reset();

        let module = LegacyStub {
            history: Rc::new(RecordingHistory::default()),
        };
        assert_eq!(router_flavor(&module), RouterFlavor::Legacy);

        reset();
    }

    #[test]
    fn missing_history_means_modern_and_the_probe_is_memoized() {
        let _guard = test_guard();
        reset();

        assert_eq!(router_flavor(&ModernStub), RouterFlavor::Modern);

        // A different module queried later gets the memoized answer.
        let legacy = LegacyStub {
            history: Rc::new(RecordingHistory::default()),
        };
        assert_eq!(router_flavor(&legacy), RouterFlavor::Modern);

        reset();
        assert_eq!(router_flavor(&legacy), RouterFlavor::Legacy);

        reset();
    }

    #[test]
    fn legacy_navigation_is_synchronous() {
        let history = Rc::new(RecordingHistory::default());
        let mut navigator = AuthNavigator {
            flavor: RouterFlavor::Legacy,
            direct: Some(history.clone() as Rc<dyn HistoryApi>),
            deferred: None,
        };

        navigator.navigate("/auth");
        navigator.navigate("/dashboard");
        assert_eq!(
            *history.pushes.borrow(),
            vec!["/auth".to_string(), "/dashboard".to_string()]
        );
    }

    #[test]
    fn auth_routes_follow_registration_order_and_dedupe() {
        let _guard = test_guard();
        reset();

        init(AuthKitConfig::new(
            app_info(),
            vec![
                stub_factory("first", vec!["/auth", "/auth/verify"]),
                stub_factory("second", vec!["/auth", "/auth/reset-password"]),
            ],
        ))
        .unwrap();

        let routes = auth_routes(&ModernStub).unwrap();
        let paths: Vec<&str> = routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/auth", "/auth/verify", "/auth/reset-password"]);

        let filtered = auth_routes_for_recipes(&ModernStub, &["second"]).unwrap();
        let filtered_paths: Vec<&str> = filtered.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(filtered_paths, vec!["/auth", "/auth/reset-password"]);

        reset();
    }

    #[test]
    fn auth_routes_require_initialization() {
        let _guard = test_guard();
        reset();

        assert!(matches!(
            auth_routes(&ModernStub),
            Err(RegistryError::Uninitialized { .. })
        ));
    }
}
