//! Animated view transitions.
//!
//! The host drives the animation by calling `tick` from its frame loop;
//! nothing here blocks or spawns.

use archie_core::ViewTransform;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewAnimation {
    pub from: ViewTransform,
    pub to: ViewTransform,
    pub start_ms: f64,
    pub duration_ms: f64,
}

impl ViewAnimation {
    pub fn new(from: ViewTransform, to: ViewTransform, start_ms: f64, duration_ms: f64) -> Self {
        Self {
            from,
            to,
            start_ms,
            duration_ms,
        }
    }

    /// Transform at `now_ms`, and whether the animation has finished.
    pub fn sample(&self, now_ms: f64) -> (ViewTransform, bool) {
        if self.duration_ms <= 0.0 {
            return (self.to, true);
        }
        let t = ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0);
        if t >= 1.0 {
            return (self.to, true);
        }
        (self.from.lerp(&self.to, ease_in_out_cubic(t) as f32), false)
    }
}

pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
