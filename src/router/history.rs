//! Direct browser navigation.

use std::rc::Rc;

/// Synchronous navigation capability.
///
/// Legacy routing modules expose one of these; modern routers keep
/// navigation inside their own scheduler and expose none, which is exactly
/// how the flavor probe tells them apart.
pub trait HistoryApi {
    /// Navigates to a site-relative path or a full URL.
    fn push(&self, to: &str);
}

/// History handle backed by the real browser window.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserHistory;

impl HistoryApi for BrowserHistory {
    fn push(&self, to: &str) {
        redirect_browser(to);
    }
}

impl BrowserHistory {
    pub fn handle() -> Rc<dyn HistoryApi> {
        Rc::new(BrowserHistory)
    }
}

/// Sends the browser to `to` via a document navigation.
#[cfg(target_arch = "wasm32")]
pub(crate) fn redirect_browser(to: &str) {
    let Some(window) = web_sys::window() else {
        tracing::warn!(target_url = %to, "no window to redirect");
        return;
    };
    if window.location().set_href(to).is_err() {
        tracing::error!(target_url = %to, "browser redirect failed");
    }
}

/// Sends the browser to `to` via a document navigation.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn redirect_browser(to: &str) {
    tracing::warn!(target_url = %to, "browser redirect is only available in the browser");
}
