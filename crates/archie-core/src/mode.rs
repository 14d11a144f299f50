//! Interaction mode shared by the gesture engine and the renderer.

use serde::{Deserialize, Serialize};

/// Determines how pointer input on the canvas is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionMode {
    #[default]
    Select,
    Pan,
    Connect,
    AddNode,
    AddContainer,
}

impl InteractionMode {
    /// CSS cursor name the host should show over the canvas.
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Select => "default",
            Self::Pan => "grab",
            Self::Connect | Self::AddNode | Self::AddContainer => "crosshair",
        }
    }

    /// Parse a host-supplied mode name (`"select"`, `"addNode"`, `"add-node"` …).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "select" => Some(Self::Select),
            "pan" => Some(Self::Pan),
            "connect" => Some(Self::Connect),
            "addnode" => Some(Self::AddNode),
            "addcontainer" => Some(Self::AddContainer),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_in_any_case() {
        assert_eq!(InteractionMode::from_name("addNode"), Some(InteractionMode::AddNode));
        assert_eq!(InteractionMode::from_name("add-container"), Some(InteractionMode::AddContainer));
        assert_eq!(InteractionMode::from_name("PAN"), Some(InteractionMode::Pan));
        assert_eq!(InteractionMode::from_name("lasso"), None);
    }

    #[test]
    fn serde_uses_camel_case() {
        let json = serde_json::to_string(&InteractionMode::AddContainer).unwrap();
        assert_eq!(json, "\"addContainer\"");
    }
}
