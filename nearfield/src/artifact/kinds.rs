//! Enumerations carried on artifact records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ArtifactError;

/// What kind of experience an artifact offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    Art,
    Menu,
    Wayfinding,
    ObjectScan,
    InfoCard,
}

impl ArtifactType {
    /// Every variant, in declaration order.
    pub const ALL: &'static [ArtifactType] = &[
        Self::Art,
        Self::Menu,
        Self::Wayfinding,
        Self::ObjectScan,
        Self::InfoCard,
    ];

    /// The wire tag for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Art => "art",
            Self::Menu => "menu",
            Self::Wayfinding => "wayfinding",
            Self::ObjectScan => "object_scan",
            Self::InfoCard => "info_card",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| ArtifactError::UnknownType(tag.to_string()))
    }
}

/// Moderation status. Only `Published` artifacts are ever shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    Draft,
    Published,
    Reported,
    Hidden,
}

impl ArtifactStatus {
    /// Every variant, in declaration order.
    pub const ALL: &'static [ArtifactStatus] = &[
        Self::Draft,
        Self::Published,
        Self::Reported,
        Self::Hidden,
    ];

    /// The wire tag for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Reported => "reported",
            Self::Hidden => "hidden",
        }
    }
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactStatus {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| ArtifactError::UnknownValue {
                field: "status",
                value: tag.to_string(),
            })
    }
}

/// Media kind of the primary asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Image,
    Video,
    #[serde(rename = "model_3d")]
    Model3d,
    Pdf,
}

impl AssetType {
    /// Every variant, in declaration order.
    pub const ALL: &'static [AssetType] = &[
        Self::Image,
        Self::Video,
        Self::Model3d,
        Self::Pdf,
    ];

    /// The wire tag for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Model3d => "model_3d",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| ArtifactError::UnknownValue {
                field: "asset_type",
                value: tag.to_string(),
            })
    }
}

/// How the AR layer anchors the artifact in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnchorMode {
    #[default]
    Gps,
    ImageTarget,
    Geoanchor,
}

impl AnchorMode {
    /// Every variant, in declaration order.
    pub const ALL: &'static [AnchorMode] = &[
        Self::Gps,
        Self::ImageTarget,
        Self::Geoanchor,
    ];

    /// The wire tag for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gps => "gps",
            Self::ImageTarget => "image_target",
            Self::Geoanchor => "geoanchor",
        }
    }
}

impl fmt::Display for AnchorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnchorMode {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| ArtifactError::UnknownValue {
                field: "anchor_mode",
                value: tag.to_string(),
            })
    }
}

impl ArtifactType {
    /// Human-readable label used by filter chips.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Art => "Art",
            Self::Menu => "Menus",
            Self::Wayfinding => "Wayfinding",
            Self::ObjectScan => "Object Scans",
            Self::InfoCard => "Info Cards",
        }
    }
}
