//! Capture orchestration.
//!
//! One run walks `loading → polling-ready → transforming → rendered`,
//! failing fatally on load errors and resource timeouts. Page-level
//! exceptions and individual resource failures only warn.

use crate::browser::{BrowserSession, SessionOptions};
use crate::config::CaptureConfig;
use crate::error::{CaptureError, Result};
use crate::readiness;
use crate::tracking::{self, RequestTracker};
use crate::transform;
use chromiumoxide::cdp::js_protocol::runtime::EventExceptionThrown;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;

/// Run one capture: returns the base64-encoded image on success.
pub async fn run(config: &CaptureConfig, options: &SessionOptions) -> Result<String> {
    let session = BrowserSession::establish(config, options).await?;
    let result = capture_on(session.page(), config).await;
    session.shutdown().await;
    result
}

async fn capture_on(page: &Page, config: &CaptureConfig) -> Result<String> {
    let tracker = RequestTracker::new();
    tracking::install_network_listeners(page, &tracker).await?;
    install_exception_listener(page).await?;

    let timeout = Duration::from_secs(config.timeout);

    tracing::debug!(url = %config.url, "navigating");
    navigate(page, &config.url, timeout).await?;

    readiness::wait_until_ready(page, &tracker, timeout).await?;

    if config.delay > 0 {
        tokio::time::sleep(Duration::from_secs(config.delay)).await;
    }

    transform::apply_and_render(page, config).await
}

async fn navigate(page: &Page, url: &str, timeout: Duration) -> Result<()> {
    match tokio::time::timeout(timeout, page.goto(url)).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(CaptureError::LoadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Err(CaptureError::LoadFailed {
            url: url.to_string(),
            reason: format!("navigation did not complete within {}s", timeout.as_secs()),
        }),
    }
}

/// Uncaught page exceptions are reported and ignored; the capture
/// proceeds.
async fn install_exception_listener(page: &Page) -> Result<()> {
    let mut exceptions = page.event_listener::<EventExceptionThrown>().await?;
    tokio::spawn(async move {
        while let Some(event) = exceptions.next().await {
            let details = &event.exception_details;
            let message = details
                .exception
                .as_ref()
                .and_then(|e| e.description.clone())
                .unwrap_or_else(|| details.text.clone());
            tracing::warn!(
                line = details.line_number,
                column = details.column_number,
                "page error: {}",
                message
            );
        }
    });
    Ok(())
}
