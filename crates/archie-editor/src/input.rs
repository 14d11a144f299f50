//! Input abstraction layer.
//!
//! Normalizes host pointer, wheel and keyboard events into one
//! `InputEvent` enum. Pointer coordinates are screen pixels relative to the
//! canvas; the session maps them to document space.

use serde::{Deserialize, Serialize};

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };

    /// ⌘ on macOS, Ctrl elsewhere.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum InputEvent {
    PointerDown {
        x: f32,
        y: f32,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerMove {
        x: f32,
        y: f32,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerUp {
        x: f32,
        y: f32,
        #[serde(default)]
        modifiers: Modifiers,
    },
    /// Pointer lost without a release (window blur, lost capture).
    PointerCancel,
    /// Wheel or pinch at `(x, y)`.
    Scroll {
        x: f32,
        y: f32,
        dx: f32,
        dy: f32,
        /// Zoom factor (1.0 = no change; >1 = zoom in).
        zoom: f32,
    },
    Key {
        /// `KeyboardEvent.key` value.
        key: String,
        #[serde(default)]
        modifiers: Modifiers,
        /// A text field has focus; shortcuts are suppressed.
        #[serde(default)]
        text_focus: bool,
    },
}

impl InputEvent {
    pub fn down(x: f32, y: f32) -> Self {
        Self::PointerDown {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn moved(x: f32, y: f32) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn up(x: f32, y: f32) -> Self {
        Self::PointerUp {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key(key: &str, modifiers: Modifiers) -> Self {
        Self::Key {
            key: key.to_string(),
            modifiers,
            text_focus: false,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<(f32, f32)> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::Scroll { x, y, .. } => Some((*x, *y)),
            Self::PointerCancel | Self::Key { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_json_decodes() {
        let e: InputEvent =
            serde_json::from_str(r#"{ "type": "pointerDown", "x": 10, "y": 20, "modifiers": { "shift": true } }"#)
                .unwrap();
        assert_eq!(
            e,
            InputEvent::PointerDown {
                x: 10.0,
                y: 20.0,
                modifiers: Modifiers::SHIFT
            }
        );
        let cancel: InputEvent = serde_json::from_str(r#"{ "type": "pointerCancel" }"#).unwrap();
        assert_eq!(cancel.position(), None);
    }
}
