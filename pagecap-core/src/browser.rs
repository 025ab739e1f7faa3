//! Browser session setup over CDP.
//!
//! One-shot lifecycle: launch (or connect to) a headless Chromium, spawn
//! the handler drain task, create the single capture page, and apply the
//! page settings from the capture configuration.

use crate::config::CaptureConfig;
use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, EnableParams, Headers, SetCookiesParams, SetExtraHttpHeadersParams,
    SetUserAgentOverrideParams,
};
use chromiumoxide::Page;
use futures::StreamExt;

/// How to reach a browser. Defaults to launching a local headless one.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Custom Chrome/Chromium binary path.
    pub browser_path: Option<String>,
    /// Connect to an already-running browser via CDP URL instead of
    /// launching one.
    pub cdp_url: Option<String>,
}

/// A live browser with the single page a capture runs against.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
}

impl BrowserSession {
    /// Launch or connect, create the page, and apply the page settings.
    pub async fn establish(config: &CaptureConfig, options: &SessionOptions) -> Result<Self> {
        let browser = if let Some(ref cdp_url) = options.cdp_url {
            let (browser, mut handler) = Browser::connect(cdp_url)
                .await
                .with_context(|| format!("Failed to connect to browser at {}", cdp_url))?;

            tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            browser
        } else {
            let mut builder = BrowserConfig::builder();

            if let Some(ref path) = options.browser_path {
                builder = builder.chrome_executable(path);
            }

            builder = builder.window_size(config.width, config.height);

            // Chrome args for stability and compatibility
            builder = builder
                .arg("--disable-dev-shm-usage")
                .arg("--remote-allow-origins=*");

            if config.no_images {
                builder = builder.arg("--blink-settings=imagesEnabled=false");
            }

            let browser_config = builder.build().map_err(|e| anyhow::anyhow!("{}", e))?;

            let (browser, mut handler) = Browser::launch(browser_config)
                .await
                .context("Failed to launch browser")?;

            tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            browser
        };

        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to create capture page")?;

        let session = Self { browser, page };
        session.configure_page(config).await?;
        Ok(session)
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Apply the configuration to the capture page: network events on,
    /// device metrics (viewport + zoom), user agent, extra headers
    /// (including the derived basic-auth header), and cookies. Runs before
    /// navigation so every request carries the settings.
    async fn configure_page(&self, config: &CaptureConfig) -> Result<()> {
        let page = &self.page;

        page.execute(EnableParams::default())
            .await
            .context("Failed to enable network events")?;

        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(config.width as i64)
            .height(config.height as i64)
            .device_scale_factor(config.scale)
            .mobile(false)
            .build()
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        page.execute(metrics)
            .await
            .context("Failed to set viewport")?;

        if let Some(ref user_agent) = config.user_agent {
            let params = SetUserAgentOverrideParams::builder()
                .user_agent(user_agent)
                .build()
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            page.execute(params)
                .await
                .context("Failed to set user agent")?;
        }

        let headers = config.resolved_headers();
        if !headers.is_empty() {
            let map = headers
                .into_iter()
                .map(|(k, v)| (k, serde_json::Value::String(v)))
                .collect();
            let params = SetExtraHttpHeadersParams::builder()
                .headers(Headers::new(serde_json::Value::Object(map)))
                .build()
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            page.execute(params)
                .await
                .context("Failed to set extra headers")?;
        }

        if !config.cookies.is_empty() {
            let mut cookies = Vec::with_capacity(config.cookies.len());
            for cookie in &config.cookies {
                let mut builder = CookieParam::builder()
                    .name(&cookie.name)
                    .value(&cookie.value);
                if let Some(ref domain) = cookie.domain {
                    builder = builder.domain(domain);
                } else {
                    // scope to the target when the caller gave no domain
                    builder = builder.url(&config.url);
                }
                if let Some(ref path) = cookie.path {
                    builder = builder.path(path);
                }
                if let Some(secure) = cookie.secure {
                    builder = builder.secure(secure);
                }
                if let Some(http_only) = cookie.http_only {
                    builder = builder.http_only(http_only);
                }
                cookies.push(
                    builder
                        .build()
                        .map_err(|e| anyhow::anyhow!("invalid cookie '{}': {}", cookie.name, e))?,
                );
            }
            page.execute(SetCookiesParams::new(cookies))
                .await
                .context("Failed to set cookies")?;
        }

        Ok(())
    }

    /// Close the browser. The process is one-shot, so a failed close is
    /// logged rather than escalated.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!(error = %e, "browser did not close cleanly");
        }
    }
}
