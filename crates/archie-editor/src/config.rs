//! Editor tuning knobs, host-supplied as JSON.
//!
//! Every field is optional on the wire; missing fields take the defaults
//! below.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Undo depth; the oldest entry is dropped beyond this.
    pub max_history: usize,
    /// Distance between parallel links, document units.
    pub link_spacing: f32,
    /// Resize floor `(width, height)`.
    pub min_node_size: (f32, f32),
    /// Fraction of the viewport fit-to-screen may fill.
    pub fit_margin: f32,
    pub fit_max_scale: f32,
    pub fit_duration_ms: f64,
    /// Gap between the contextual toolbar and the selection, screen pixels.
    pub toolbar_offset_px: f32,
    pub duplicate_offset: f32,
    pub default_node_size: (f32, f32),
    pub default_container_size: (f32, f32),
    /// Pointer travel below which a press-release counts as a click.
    pub click_tolerance_px: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history: 200,
            link_spacing: 24.0,
            min_node_size: (40.0, 30.0),
            fit_margin: 0.9,
            fit_max_scale: 4.0,
            fit_duration_ms: 300.0,
            toolbar_offset_px: 48.0,
            duplicate_offset: 24.0,
            default_node_size: (120.0, 60.0),
            default_container_size: (320.0, 200.0),
            click_tolerance_px: 3.0,
        }
    }
}

impl EditorConfig {
    /// Parse a partial JSON config. Unknown fields are ignored.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(r#"{ "maxHistory": 5, "minNodeSize": [10, 10] }"#).unwrap();
        assert_eq!(config.max_history, 5);
        assert_eq!(config.min_node_size, (10.0, 10.0));
        assert_eq!(config.link_spacing, 24.0);
        assert_eq!(config.fit_duration_ms, 300.0);
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(EditorConfig::from_json("{}").unwrap(), EditorConfig::default());
    }
}
