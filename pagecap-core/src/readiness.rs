//! Readiness polling loop.
//!
//! Every 500 ms the document ready state is probed in page context and the
//! request tracker is consulted; both must pass before rendering. The loop
//! has no ceiling of its own — the configured resource timeout is the only
//! bound, and exceeding it is fatal.

use crate::error::{CaptureError, Result};
use crate::tracking::RequestTracker;
use chromiumoxide::Page;
use std::time::{Duration, Instant};

pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

const READY_STATE_PROBE: &str =
    r#"document.readyState === "interactive" || document.readyState === "complete""#;

/// One poll-loop decision. Kept free of CDP types so the loop semantics
/// are unit-testable.
fn decide(
    document_ready: bool,
    tracker: &RequestTracker,
    elapsed: Duration,
    timeout: Duration,
) -> Result<bool> {
    if document_ready && tracker.is_idle() {
        return Ok(true);
    }

    if elapsed >= timeout {
        let detail = match tracker.sample_pending() {
            Some(id) => format!("request #{} still pending", id),
            None => "document not ready".to_string(),
        };
        return Err(CaptureError::ResourceTimeout {
            elapsed_secs: elapsed.as_secs(),
            detail,
        });
    }

    Ok(false)
}

async fn document_ready(page: &Page) -> bool {
    match page.evaluate(READY_STATE_PROBE).await {
        Ok(result) => result.into_value::<bool>().unwrap_or(false),
        Err(e) => {
            tracing::debug!(error = %e, "ready-state probe failed, treating as not ready");
            false
        }
    }
}

/// Block until the document is interactive/complete and no tracked request
/// is outstanding, or until the resource timeout expires.
pub async fn wait_until_ready(
    page: &Page,
    tracker: &RequestTracker,
    timeout: Duration,
) -> Result<()> {
    let start = Instant::now();

    loop {
        tokio::time::sleep(POLL_INTERVAL).await;

        let ready = document_ready(page).await;
        if decide(ready, tracker, start.elapsed(), timeout)? {
            tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "page ready");
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_on_first_evaluation_with_no_resources() {
        let tracker = RequestTracker::new();
        let ready = decide(true, &tracker, Duration::ZERO, Duration::from_secs(60)).unwrap();
        assert!(ready);
    }

    #[test]
    fn test_pending_requests_keep_polling() {
        let tracker = RequestTracker::new();
        tracker.track("3");
        let ready = decide(true, &tracker, Duration::from_secs(1), Duration::from_secs(60)).unwrap();
        assert!(!ready);
    }

    #[test]
    fn test_document_not_ready_keeps_polling() {
        let tracker = RequestTracker::new();
        let ready = decide(false, &tracker, Duration::from_secs(1), Duration::from_secs(60)).unwrap();
        assert!(!ready);
    }

    #[test]
    fn test_deadline_with_pending_request_names_it() {
        let tracker = RequestTracker::new();
        tracker.track("42");
        let err = decide(true, &tracker, Duration::from_secs(61), Duration::from_secs(60))
            .unwrap_err();
        match err {
            CaptureError::ResourceTimeout { detail, .. } => {
                assert!(detail.contains("#42"), "detail was: {}", detail);
            }
            other => panic!("expected ResourceTimeout, got {:?}", other),
        }
    }

    #[test]
    fn test_deadline_with_stuck_document() {
        let tracker = RequestTracker::new();
        let err =
            decide(false, &tracker, Duration::from_secs(61), Duration::from_secs(60)).unwrap_err();
        assert!(matches!(err, CaptureError::ResourceTimeout { .. }));
    }
}
