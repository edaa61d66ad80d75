//! Deferred navigation for routers that reject mid-render jumps.
//!
//! Modern host routers schedule navigation themselves; calling their
//! navigate function while a render is committing is at best ignored. The
//! pattern here: screens push requests into a [`NavigationQueue`], and an
//! effect drains the queue after commit, one dispatch per run. A request
//! made while another was being dispatched simply waits for the next run,
//! so navigations stay ordered and none are dropped.

use std::collections::VecDeque;

use dioxus::prelude::*;

/// FIFO of navigation requests with in-flight accounting.
///
/// At most one request is out for dispatch at a time: [`begin`] hands out
/// nothing until the previous dispatch is [`complete`]d.
///
/// [`begin`]: NavigationQueue::begin
/// [`complete`]: NavigationQueue::complete
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationQueue {
    pending: VecDeque<String>,
    in_flight: bool,
}

impl NavigationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a navigation request.
    pub fn request(&mut self, to: impl Into<String>) {
        let to = to.into();
        tracing::trace!(target_path = %to, "navigation queued");
        self.pending.push_back(to);
    }

    /// Takes the next request for dispatch.
    ///
    /// Returns `None` while a dispatch is in flight or the queue is empty.
    pub fn begin(&mut self) -> Option<String> {
        if self.in_flight {
            return None;
        }
        let next = self.pending.pop_front()?;
        self.in_flight = true;
        Some(next)
    }

    /// Marks the in-flight dispatch resolved, allowing the next [`begin`].
    ///
    /// [`begin`]: NavigationQueue::begin
    pub fn complete(&mut self) {
        self.in_flight = false;
    }

    /// Whether a dispatch is currently unresolved.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Requests waiting for dispatch.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// No pending requests and nothing in flight.
    pub fn is_idle(&self) -> bool {
        !self.in_flight && self.pending.is_empty()
    }
}

/// Handle for requesting deferred navigation from event handlers and
/// effects. Cheap to copy into closures.
#[derive(Clone, Copy)]
pub struct DeferredNavigator {
    queue: Signal<NavigationQueue>,
}

impl DeferredNavigator {
    /// Queues a navigation; it dispatches after the current commit.
    pub fn push(&mut self, to: impl Into<String>) {
        self.queue.write().request(to);
    }
}

/// Hook: queues navigations and drains them after commit.
///
/// One request dispatches per effect run. Draining writes the queue signal,
/// which re-runs the effect, so requests queued while one was in flight
/// dispatch on the following runs until the queue is empty.
pub fn use_deferred_navigator(on_navigate: Callback<String>) -> DeferredNavigator {
    let mut queue = use_signal(NavigationQueue::new);

    use_effect(move || {
        // The read subscribes this effect to later queue writes.
        if queue.read().is_idle() {
            return;
        }
        let next = queue.write().begin();
        if let Some(to) = next {
            tracing::trace!(target_path = %to, "dispatching deferred navigation");
            on_navigate.call(to);
            queue.write().complete();
        }
    });

    DeferredNavigator { queue }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_queue_hands_out_nothing() {
        let mut queue = NavigationQueue::new();
        assert_eq!(queue.begin(), None);
        assert!(queue.is_idle());
    }

    #[test]
    fn two_requests_dispatch_sequentially_and_none_drop() {
        let mut queue = NavigationQueue::new();
        queue.request("/first");
        queue.request("/second");

        assert_eq!(queue.begin(), Some("/first".to_string()));
        // Second request waits while the first is in flight.
        assert_eq!(queue.begin(), None);
        assert!(queue.is_in_flight());

        queue.complete();
        assert_eq!(queue.begin(), Some("/second".to_string()));
        queue.complete();

        assert_eq!(queue.begin(), None);
        assert!(queue.is_idle());
    }

    #[test]
    fn requests_made_mid_flight_keep_their_order() {
        let mut queue = NavigationQueue::new();
        queue.request("/a");
        assert_eq!(queue.begin(), Some("/a".to_string()));

        queue.request("/b");
        queue.request("/c");
        assert_eq!(queue.pending(), 2);

        queue.complete();
        assert_eq!(queue.begin(), Some("/b".to_string()));
        queue.complete();
        assert_eq!(queue.begin(), Some("/c".to_string()));
    }

    #[test]
    fn complete_without_begin_is_harmless() {
        let mut queue = NavigationQueue::new();
        queue.complete();
        queue.request("/only");
        assert_eq!(queue.begin(), Some("/only".to_string()));
    }
}
