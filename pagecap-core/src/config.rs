//! Capture configuration decoded from the JSON payload.
//!
//! One flat record per invocation, camelCase on the wire.

use crate::error::{CaptureError, Result};
use base64::Engine;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    800
}

fn default_scale() -> f64 {
    1.0
}

fn default_timeout_secs() -> u64 {
    60
}

/// Output image format, mapped onto the CDP screenshot formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub fn as_cdp(self) -> CaptureScreenshotFormat {
        match self {
            ImageFormat::Png => CaptureScreenshotFormat::Png,
            ImageFormat::Jpeg => CaptureScreenshotFormat::Jpeg,
            ImageFormat::Webp => CaptureScreenshotFormat::Webp,
        }
    }
}

/// Cookie installed before navigation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Cookie {
    #[validate(length(min = 1))]
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub secure: Option<bool>,
    pub http_only: Option<bool>,
}

/// Clip directive centered on one element, with fractional margins.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FocusSelector {
    #[validate(length(min = 1))]
    pub selector: String,

    /// Horizontal margin as a fraction of the free horizontal space.
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub horiz_margin: f64,

    /// Vertical margin as a fraction of the free vertical space.
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub vert_margin: f64,
}

/// The one transient value of a capture run.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CaptureConfig {
    /// Target URL.
    #[validate(length(min = 1))]
    pub url: String,

    /// Viewport width in CSS pixels.
    #[serde(default = "default_width")]
    #[validate(range(min = 1))]
    pub width: u32,

    /// Viewport height in CSS pixels.
    #[serde(default = "default_height")]
    #[validate(range(min = 1))]
    pub height: u32,

    /// Zoom factor applied to the rendered page and to selector clips.
    #[serde(default = "default_scale")]
    #[validate(range(min = 0.1, max = 8.0))]
    pub scale: f64,

    /// User agent override.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Extra HTTP headers sent with every request.
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Basic-auth user; only used together with `password`.
    #[serde(default)]
    pub username: Option<String>,

    /// Basic-auth password; only used together with `username`.
    #[serde(default)]
    pub password: Option<String>,

    /// Disable image loading.
    #[serde(default)]
    pub no_images: bool,

    /// Resource timeout in seconds; the only bound on the readiness loop.
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1, max = 600))]
    pub timeout: u64,

    /// Cookies installed before navigation.
    #[serde(default)]
    #[validate(nested)]
    pub cookies: Vec<Cookie>,

    /// Clip the capture to the viewport rectangle.
    #[serde(default)]
    pub crop: bool,

    /// CSS injected into the page after load.
    #[serde(default)]
    pub css: Option<String>,

    /// Selectors whose matches are made invisible.
    #[serde(default)]
    pub hide: Vec<String>,

    /// Clip to this element's bounding box, scaled by `scale`.
    #[serde(default)]
    pub selector: Option<String>,

    /// Script body executed in page context after load.
    #[serde(default)]
    pub script: Option<String>,

    /// Clip around one element with fractional margins.
    #[serde(default)]
    #[validate(nested)]
    pub focus_selector: Option<FocusSelector>,

    /// Clip to the top band of the page up to this pixel offset; wins over
    /// every other clip directive.
    #[serde(default)]
    #[validate(range(min = 1.0))]
    pub vert_offset: Option<f64>,

    /// Seconds to pause between readiness and the transform pass.
    #[serde(default)]
    #[validate(range(max = 300))]
    pub delay: u64,

    /// Output image format.
    #[serde(default)]
    pub format: ImageFormat,
}

impl CaptureConfig {
    /// Decode and validate a configuration from its JSON payload.
    pub fn from_json(payload: &str) -> Result<Self> {
        let config: CaptureConfig =
            serde_json::from_str(payload).map_err(|e| CaptureError::Config(e.to_string()))?;
        config
            .validate()
            .map_err(|e| CaptureError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Headers to install on the page: the configured extras, plus an
    /// `Authorization` entry derived from the basic-auth credentials when
    /// both are present. The derived entry overwrites a caller-supplied one.
    pub fn resolved_headers(&self) -> HashMap<String, String> {
        let mut headers = self.headers.clone();
        if let (Some(user), Some(pass)) = (&self.username, &self.password) {
            let token =
                base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", user, pass));
            headers.insert("Authorization".to_string(), format!("Basic {}", token));
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_defaults() {
        let config = CaptureConfig::from_json(r#"{"url": "https://example.com"}"#).unwrap();
        assert_eq!(config.width, 1280);
        assert_eq!(config.height, 800);
        assert_eq!(config.scale, 1.0);
        assert_eq!(config.timeout, 60);
        assert_eq!(config.delay, 0);
        assert_eq!(config.format, ImageFormat::Png);
        assert!(!config.crop);
        assert!(!config.no_images);
        assert!(config.hide.is_empty());
        assert!(config.cookies.is_empty());
    }

    #[test]
    fn test_full_config_decodes() {
        let payload = r##"{
            "url": "https://example.com/dashboard",
            "width": 1920,
            "height": 1080,
            "scale": 2.0,
            "userAgent": "pagecap/0.1",
            "headers": {"X-Request-Source": "pagecap"},
            "username": "user",
            "password": "secret",
            "noImages": true,
            "timeout": 30,
            "cookies": [{"name": "session", "value": "abc", "domain": "example.com", "path": "/"}],
            "crop": true,
            "css": "body { margin: 0; }",
            "hide": [".cookie-banner", "#chat-widget"],
            "selector": "#chart",
            "script": "window.scrollTo(0, 0);",
            "focusSelector": {"selector": "#chart", "horizMargin": 0.2, "vertMargin": 0.4},
            "vertOffset": 600,
            "delay": 2,
            "format": "jpeg"
        }"##;

        let config = CaptureConfig::from_json(payload).unwrap();
        assert_eq!(config.width, 1920);
        assert_eq!(config.user_agent.as_deref(), Some("pagecap/0.1"));
        assert!(config.no_images);
        assert_eq!(config.cookies.len(), 1);
        assert_eq!(config.hide.len(), 2);
        assert_eq!(config.selector.as_deref(), Some("#chart"));
        let focus = config.focus_selector.as_ref().unwrap();
        assert_eq!(focus.selector, "#chart");
        assert_eq!(focus.horiz_margin, 0.2);
        assert_eq!(focus.vert_margin, 0.4);
        assert_eq!(config.vert_offset, Some(600.0));
        assert_eq!(config.format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = CaptureConfig::from_json(r#"{"url": "https://example.com", "bogus": 1}"#)
            .unwrap_err();
        assert!(matches!(err, CaptureError::Config(_)));
    }

    #[test]
    fn test_missing_url_rejected() {
        assert!(CaptureConfig::from_json(r#"{"width": 800}"#).is_err());
    }

    #[test]
    fn test_margin_out_of_range_rejected() {
        let payload = r##"{
            "url": "https://example.com",
            "focusSelector": {"selector": "#x", "vertMargin": 1.5}
        }"##;
        let err = CaptureConfig::from_json(payload).unwrap_err();
        assert!(matches!(err, CaptureError::Config(_)));
    }

    #[test]
    fn test_basic_auth_header() {
        let payload = r#"{"url": "https://example.com", "username": "username", "password": "password"}"#;
        let config = CaptureConfig::from_json(payload).unwrap();
        let headers = config.resolved_headers();
        assert_eq!(
            headers.get("Authorization").map(String::as_str),
            Some("Basic dXNlcm5hbWU6cGFzc3dvcmQ=")
        );
    }

    #[test]
    fn test_basic_auth_overwrites_caller_header() {
        let payload = r#"{
            "url": "https://example.com",
            "headers": {"Authorization": "Bearer stale"},
            "username": "u",
            "password": "p"
        }"#;
        let headers = CaptureConfig::from_json(payload).unwrap().resolved_headers();
        assert!(headers["Authorization"].starts_with("Basic "));
    }

    #[test]
    fn test_one_sided_credentials_add_nothing() {
        let payload = r#"{"url": "https://example.com", "username": "user"}"#;
        let headers = CaptureConfig::from_json(payload).unwrap().resolved_headers();
        assert!(!headers.contains_key("Authorization"));
    }

    #[test]
    fn test_format_parsing() {
        for (name, expected) in [
            ("png", ImageFormat::Png),
            ("jpeg", ImageFormat::Jpeg),
            ("webp", ImageFormat::Webp),
        ] {
            let payload = format!(r#"{{"url": "https://example.com", "format": "{}"}}"#, name);
            assert_eq!(CaptureConfig::from_json(&payload).unwrap().format, expected);
        }
        assert!(CaptureConfig::from_json(r#"{"url": "x", "format": "gif"}"#).is_err());
    }
}
