//! Headless browser capture library.
//!
//! Drives a Chromium-family browser over CDP to load a URL, wait for
//! network/DOM readiness, apply optional page transforms (CSS injection,
//! element hiding, clip rectangles, caller script), and render a
//! base64-encoded screenshot. The whole run is described by one
//! [`CaptureConfig`] decoded from a JSON payload.

pub mod browser;
pub mod capture;
pub mod config;
pub mod error;
pub mod geometry;
pub mod readiness;
pub mod tracking;
pub mod transform;

pub use browser::SessionOptions;
pub use config::{CaptureConfig, Cookie, FocusSelector, ImageFormat};
pub use error::{CaptureError, Result};

/// Run one capture against a locally-launched headless browser.
pub async fn capture(config: &CaptureConfig) -> Result<String> {
    capture::run(config, &SessionOptions::default()).await
}
