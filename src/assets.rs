//! Static asset paths
//!
//! Sprites and sounds are addressed as `{type}/{variant}/{code}.png` under a
//! static root. The engines only format these strings; fetching is the
//! page's business.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Asset category, the first path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Character,
    Tile,
    Obstacle,
    Pickup,
    Background,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Character => "character",
            AssetKind::Tile => "tile",
            AssetKind::Obstacle => "obstacle",
            AssetKind::Pickup => "pickup",
            AssetKind::Background => "background",
        }
    }
}

/// Opaque reference to a sprite image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub kind: AssetKind,
    pub variant: String,
    pub code: String,
}

impl AssetRef {
    pub fn new(kind: AssetKind, variant: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            kind,
            variant: variant.into(),
            code: code.into(),
        }
    }

    /// Full URL under `root`, tolerating a trailing slash on the root
    pub fn resolve(&self, root: &str) -> String {
        let root = root.trim_end_matches('/');
        if root.is_empty() {
            self.to_string()
        } else {
            format!("{}/{}", root, self)
        }
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}.png", self.kind.as_str(), self.variant, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path() {
        let asset = AssetRef::new(AssetKind::Character, "runner", "idle");
        assert_eq!(asset.to_string(), "character/runner/idle.png");
    }

    #[test]
    fn test_resolve_against_root() {
        let asset = AssetRef::new(AssetKind::Tile, "grass", "03");
        assert_eq!(asset.resolve("/static/"), "/static/tile/grass/03.png");
        assert_eq!(
            asset.resolve("https://cdn.example.com/assets"),
            "https://cdn.example.com/assets/tile/grass/03.png"
        );
        assert_eq!(asset.resolve(""), "tile/grass/03.png");
    }
}
