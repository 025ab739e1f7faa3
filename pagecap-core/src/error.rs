//! Error taxonomy for a capture run.
//!
//! Only fatal conditions become errors; individual resource failures and
//! page script exceptions are logged as warnings and never surface here.

use thiserror::Error;

/// Result type alias for capture operations.
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Errors that abort a capture run.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The configuration payload could not be decoded or failed validation.
    #[error("invalid capture configuration: {0}")]
    Config(String),

    /// Navigation to the target URL failed or did not complete in time.
    #[error("couldn't load url: {url} ({reason})")]
    LoadFailed { url: String, reason: String },

    /// The readiness wait exceeded the configured resource timeout.
    #[error("resource timed out after {elapsed_secs}s ({detail})")]
    ResourceTimeout { elapsed_secs: u64, detail: String },

    /// A clip or focus selector matched no element.
    #[error("no element matches selector '{0}'")]
    SelectorNotFound(String),

    /// Browser session setup failed (launch, connect, page configuration).
    #[error("browser error: {0}")]
    Browser(String),

    /// A CDP command or evaluation failed.
    #[error("cdp error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
}

impl From<anyhow::Error> for CaptureError {
    fn from(err: anyhow::Error) -> Self {
        CaptureError::Browser(format!("{:#}", err))
    }
}
