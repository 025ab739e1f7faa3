//! In-flight network request tracking.
//!
//! The readiness check consults this set; CDP network events feed it.
//! Completion order is not FIFO, so removal is by value. There is no
//! deduplication guard: an identifier tracked twice needs two completion
//! events to clear.

use crate::error::Result;
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::Page;
use futures::StreamExt;
use std::sync::{Arc, Mutex};

/// Shared set of pending network-request identifiers.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    pending: Arc<Mutex<Vec<String>>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outgoing request.
    pub fn track(&self, id: impl Into<String>) {
        self.pending.lock().unwrap().push(id.into());
    }

    /// Remove one occurrence of `id`. Removing an identifier that was
    /// never tracked is a silent no-op.
    pub fn complete(&self, id: &str) {
        let mut pending = self.pending.lock().unwrap();
        if let Some(pos) = pending.iter().position(|p| p == id) {
            pending.remove(pos);
        }
    }

    /// True when no tracked request is outstanding.
    pub fn is_idle(&self) -> bool {
        self.pending.lock().unwrap().is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// One still-pending identifier, for diagnostics.
    pub fn sample_pending(&self) -> Option<String> {
        self.pending.lock().unwrap().first().cloned()
    }
}

/// Subscribe the tracker to the page's network events.
///
/// Spawns one drain task per event kind; the tasks end when the page's
/// event streams close on browser shutdown.
pub async fn install_network_listeners(page: &Page, tracker: &RequestTracker) -> Result<()> {
    let mut requests = page.event_listener::<EventRequestWillBeSent>().await?;
    let t = tracker.clone();
    tokio::spawn(async move {
        while let Some(event) = requests.next().await {
            t.track(event.request_id.inner().to_string());
        }
    });

    let mut finished = page.event_listener::<EventLoadingFinished>().await?;
    let t = tracker.clone();
    tokio::spawn(async move {
        while let Some(event) = finished.next().await {
            t.complete(event.request_id.inner());
        }
    });

    let mut failed = page.event_listener::<EventLoadingFailed>().await?;
    let t = tracker.clone();
    tokio::spawn(async move {
        while let Some(event) = failed.next().await {
            tracing::warn!(
                request_id = %event.request_id.inner(),
                error = %event.error_text,
                "unable to load resource"
            );
            t.complete(event.request_id.inner());
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_tracker_is_idle() {
        assert!(RequestTracker::new().is_idle());
    }

    #[test]
    fn test_track_and_complete() {
        let tracker = RequestTracker::new();
        tracker.track("1");
        tracker.track("2");
        assert!(!tracker.is_idle());

        // completion order is not FIFO
        tracker.complete("2");
        tracker.complete("1");
        assert!(tracker.is_idle());
    }

    #[test]
    fn test_unknown_id_completion_is_a_no_op() {
        let tracker = RequestTracker::new();
        tracker.track("1");
        tracker.complete("99");
        assert_eq!(tracker.pending_count(), 1);
    }

    #[test]
    fn test_duplicate_id_needs_two_completions() {
        let tracker = RequestTracker::new();
        tracker.track("1");
        tracker.track("1");
        tracker.complete("1");
        assert_eq!(tracker.pending_count(), 1);
        tracker.complete("1");
        assert!(tracker.is_idle());
    }

    #[test]
    fn test_sample_pending() {
        let tracker = RequestTracker::new();
        assert_eq!(tracker.sample_pending(), None);
        tracker.track("7");
        assert_eq!(tracker.sample_pending().as_deref(), Some("7"));
    }
}
