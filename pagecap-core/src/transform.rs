//! Post-load page transforms and rendering.
//!
//! Runs once after readiness (plus the configured delay): background/CSS
//! fixup, element hiding, clip measurement, caller script, and the final
//! screenshot. Caller-supplied values are embedded into the page-context
//! scripts as JSON literals so quoting is never an issue.

use crate::config::CaptureConfig;
use crate::error::{CaptureError, Result};
use crate::geometry::{ClipCandidates, Rect};
use base64::Engine;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotParams, Viewport};
use chromiumoxide::Page;

/// Forces a white background when the body has none, and injects the
/// caller CSS in the same pass.
fn page_setup_script(css: Option<&str>) -> String {
    let css_literal = serde_json::to_string(&css).unwrap_or_else(|_| "null".to_string());
    format!(
        r#"(() => {{
    const css = {css_literal};
    const bgColor = window
        .getComputedStyle(document.body)
        .getPropertyValue('background-color');
    if (!bgColor || bgColor === 'rgba(0, 0, 0, 0)') {{
        document.body.style.backgroundColor = 'white';
    }}
    if (css) {{
        const el = document.createElement('style');
        el.appendChild(document.createTextNode(css));
        document.head.appendChild(el);
    }}
}})()"#
    )
}

fn hide_script(selectors: &[String]) -> String {
    let selectors_literal =
        serde_json::to_string(selectors).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"(() => {{
    for (const sel of {selectors_literal}) {{
        for (const el of document.querySelectorAll(sel)) {{
            el.style.visibility = 'hidden';
        }}
    }}
}})()"#
    )
}

fn bounding_rect_script(selector: &str) -> String {
    let selector_literal =
        serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r#"(() => {{
    const el = document.querySelector({selector_literal});
    if (!el) {{
        return null;
    }}
    const r = el.getBoundingClientRect();
    return {{ left: r.left, top: r.top, width: r.width, height: r.height }};
}})()"#
    )
}

/// Measure one element's bounding box via the DOM bridge.
async fn bounding_rect(page: &Page, selector: &str) -> Result<Rect> {
    let result = page.evaluate(bounding_rect_script(selector)).await?;
    result
        .into_value::<Option<Rect>>()
        .ok()
        .flatten()
        .ok_or_else(|| CaptureError::SelectorNotFound(selector.to_string()))
}

/// Run the caller script body in page context. A thrown exception is a
/// warning, never fatal.
async fn run_caller_script(page: &Page, script: &str) {
    let wrapped = format!("(function () {{ {} }})()", script);
    if let Err(e) = page.evaluate(wrapped).await {
        tracing::warn!(error = %e, "caller script failed");
    }
}

/// Apply the post-load transforms and render the page, returning the
/// base64-encoded image.
pub async fn apply_and_render(page: &Page, config: &CaptureConfig) -> Result<String> {
    page.evaluate(page_setup_script(config.css.as_deref()))
        .await?;

    if !config.hide.is_empty() {
        page.evaluate(hide_script(&config.hide)).await?;
    }

    let mut candidates = ClipCandidates::default();

    if config.crop {
        candidates.crop = Some(Rect::new(
            0.0,
            0.0,
            config.width as f64,
            config.height as f64,
        ));
    }

    if let Some(ref selector) = config.selector {
        let rect = bounding_rect(page, selector).await?;
        candidates.selector = Some(rect.scaled(config.scale));
    }

    if let Some(ref script) = config.script {
        run_caller_script(page, script).await;
    }

    if let Some(ref focus) = config.focus_selector {
        let rect = bounding_rect(page, &focus.selector).await?;
        candidates.focus = Some(rect.expand_by_margins(
            config.width as f64,
            config.height as f64,
            focus.horiz_margin,
            focus.vert_margin,
        ));
    }

    if let Some(vert_offset) = config.vert_offset {
        candidates.vert_offset = Some(Rect::top_band(config.width as f64, vert_offset));
    }

    let mut params = CaptureScreenshotParams::builder().format(config.format.as_cdp());
    if let Some(clip) = candidates.resolve() {
        params = params.clip(Viewport {
            x: clip.left,
            y: clip.top,
            width: clip.width,
            height: clip.height,
            scale: 1.0,
        });
    }

    let bytes = page.screenshot(params.build()).await?;
    Ok(base64::engine::general_purpose::STANDARD.encode(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_setup_script_embeds_css_literal() {
        let script = page_setup_script(Some("body { color: \"red\"; }"));
        assert!(script.contains(r#"const css = "body { color: \"red\"; }";"#));
        assert!(script.contains("backgroundColor = 'white'"));
    }

    #[test]
    fn test_page_setup_script_without_css() {
        let script = page_setup_script(None);
        assert!(script.contains("const css = null;"));
    }

    #[test]
    fn test_hide_script_embeds_selector_array() {
        let script = hide_script(&[".banner".to_string(), "#ad".to_string()]);
        assert!(script.contains(r##"[".banner","#ad"]"##));
        assert!(script.contains("visibility = 'hidden'"));
    }

    #[test]
    fn test_bounding_rect_script_quotes_selector() {
        let script = bounding_rect_script("a[href=\"/\"]");
        assert!(script.contains(r#"document.querySelector("a[href=\"/\"]")"#));
    }
}
