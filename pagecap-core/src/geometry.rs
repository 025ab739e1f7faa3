//! Clip-rectangle arithmetic.
//!
//! Pure math, kept apart from the CDP plumbing so the clip semantics stay
//! unit-testable: selector scaling, focus-margin expansion, the top band,
//! and the last-wins precedence between competing clip directives.

use serde::{Deserialize, Serialize};

/// A page rectangle in the same coordinate space as
/// `Element.getBoundingClientRect()`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Multiply all four fields by the zoom factor.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            left: self.left * factor,
            top: self.top * factor,
            width: self.width * factor,
            height: self.height * factor,
        }
    }

    /// Expand the rectangle by fractional margins of the free viewport
    /// space, per axis. For a margin m in (0, 1], the extent grows by
    /// m * (viewport extent - rect extent) and the origin moves back by
    /// half of that, keeping the center fixed. Margins outside (0, 1]
    /// leave the axis untouched.
    pub fn expand_by_margins(
        self,
        viewport_width: f64,
        viewport_height: f64,
        horiz_margin: f64,
        vert_margin: f64,
    ) -> Self {
        let mut rect = self;

        if vert_margin > 0.0 && vert_margin <= 1.0 {
            let available = viewport_height - rect.height;
            let extra = available * vert_margin;
            rect.height += extra;
            rect.top -= extra / 2.0;
        }

        if horiz_margin > 0.0 && horiz_margin <= 1.0 {
            let available = viewport_width - rect.width;
            let extra = available * horiz_margin;
            rect.width += extra;
            rect.left -= extra / 2.0;
        }

        rect
    }

    /// The fixed top-left band of the page, `vert_offset` pixels tall.
    pub fn top_band(width: f64, vert_offset: f64) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height: vert_offset,
        }
    }

}

/// The clip candidates of one capture, in configuration order.
///
/// Each populated candidate overwrites the previous one, so the resolved
/// clip is the last populated entry: `crop`, then `selector`, then
/// `focus`, then `vert_offset`. All fields `None` means an unclipped
/// capture.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClipCandidates {
    /// Viewport rectangle, from the `crop` flag.
    pub crop: Option<Rect>,
    /// Scaled bounding box of the clip selector.
    pub selector: Option<Rect>,
    /// Margin-expanded bounding box of the focus selector.
    pub focus: Option<Rect>,
    /// Top band up to the vertical pixel offset.
    pub vert_offset: Option<Rect>,
}

impl ClipCandidates {
    /// Resolve the last-wins precedence.
    pub fn resolve(self) -> Option<Rect> {
        self.vert_offset
            .or(self.focus)
            .or(self.selector)
            .or(self.crop)
    }
}
