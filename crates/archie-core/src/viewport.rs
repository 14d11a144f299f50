//! Document ↔ screen mapping.
//!
//! The view is an affine transform with uniform scale:
//! `screen = document * scale + translate`.

use crate::model::Bounds;
use serde::{Deserialize, Serialize};

pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 4.0;

/// The canvas (screen) dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// Pan/zoom transform from document space to screen space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewTransform {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: ViewTransform = ViewTransform {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
    };

    /// Construct with the scale clamped to `[MIN_SCALE, MAX_SCALE]`.
    pub fn new(translate_x: f32, translate_y: f32, scale: f32) -> Self {
        Self {
            translate_x,
            translate_y,
            scale: clamp_scale(scale),
        }
    }

    pub fn to_screen(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.scale + self.translate_x,
            y * self.scale + self.translate_y,
        )
    }

    pub fn to_document(&self, sx: f32, sy: f32) -> (f32, f32) {
        (
            (sx - self.translate_x) / self.scale,
            (sy - self.translate_y) / self.scale,
        )
    }

    /// Project a document box to screen space.
    pub fn bounds_to_screen(&self, b: &Bounds) -> Bounds {
        let (x, y) = self.to_screen(b.x, b.y);
        Bounds::new(x, y, b.width * self.scale, b.height * self.scale)
    }

    /// Shift the view by a screen-space delta.
    #[must_use]
    pub fn panned(&self, dx: f32, dy: f32) -> Self {
        Self {
            translate_x: self.translate_x + dx,
            translate_y: self.translate_y + dy,
            scale: self.scale,
        }
    }

    /// Zoom by `factor`, keeping the document point under `(sx, sy)` fixed.
    #[must_use]
    pub fn zoomed_at(&self, sx: f32, sy: f32, factor: f32) -> Self {
        let scale = clamp_scale(self.scale * factor);
        let (dx, dy) = self.to_document(sx, sy);
        Self {
            translate_x: sx - dx * scale,
            translate_y: sy - dy * scale,
            scale,
        }
    }

    /// Component-wise interpolation, `t` in `[0, 1]`.
    #[must_use]
    pub fn lerp(&self, to: &ViewTransform, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Self {
            translate_x: mix(self.translate_x, to.translate_x),
            translate_y: mix(self.translate_y, to.translate_y),
            scale: clamp_scale(mix(self.scale, to.scale)),
        }
    }
}

pub fn clamp_scale(scale: f32) -> f32 {
    if scale.is_finite() {
        scale.clamp(MIN_SCALE, MAX_SCALE)
    } else {
        1.0
    }
}

/// Framing parameters for [`fit_transform`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Fraction of the viewport the content may occupy.
    pub margin: f32,
    pub max_scale: f32,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            margin: 0.9,
            max_scale: MAX_SCALE,
        }
    }
}

/// Transform that centers `content` in `viewport` at the largest scale that
/// keeps it within `margin` of the viewport. `None` for zero-area content.
pub fn fit_transform(content: Bounds, viewport: Viewport, options: FitOptions) -> Option<ViewTransform> {
    if !(content.width > 0.0 && content.height > 0.0) {
        return None;
    }
    if !(viewport.width > 0.0 && viewport.height > 0.0) {
        return None;
    }
    let ratio = (content.width / viewport.width).max(content.height / viewport.height);
    let scale = clamp_scale(options.max_scale.min(options.margin / ratio));
    let (cx, cy) = content.center();
    Some(ViewTransform {
        translate_x: viewport.width / 2.0 - cx * scale,
        translate_y: viewport.height / 2.0 - cy * scale,
        scale,
    })
}
