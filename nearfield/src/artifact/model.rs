//! The artifact record and its view-distance band.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::ArtifactError;
use super::kinds::{AnchorMode, ArtifactStatus, ArtifactType, AssetType};
use crate::geo::GeoPoint;

/// Unique artifact identity.
pub type ArtifactId = u64;

/// Default band used when a record omits it.
const DEFAULT_MIN_VIEW_DISTANCE: f64 = 0.0;
const DEFAULT_MAX_VIEW_DISTANCE: f64 = 100.0;

/// The distance band, in meters, within which an artifact can be viewed.
///
/// Always satisfies `0 <= min < max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewDistance {
    min_meters: f64,
    max_meters: f64,
}

impl ViewDistance {
    pub fn new(min_meters: f64, max_meters: f64) -> Result<Self, ArtifactError> {
        let valid = min_meters.is_finite()
            && max_meters.is_finite()
            && min_meters >= 0.0
            && min_meters < max_meters;
        if !valid {
            return Err(ArtifactError::InvalidViewDistance {
                min: min_meters,
                max: max_meters,
            });
        }
        Ok(Self {
            min_meters,
            max_meters,
        })
    }

    /// Closer than this, the artifact is locked.
    #[inline]
    pub fn min(&self) -> f64 {
        self.min_meters
    }

    /// Farther than this, the artifact is out of range.
    #[inline]
    pub fn max(&self) -> f64 {
        self.max_meters
    }
}

impl Default for ViewDistance {
    fn default() -> Self {
        Self {
            min_meters: DEFAULT_MIN_VIEW_DISTANCE,
            max_meters: DEFAULT_MAX_VIEW_DISTANCE,
        }
    }
}

/// A location-anchored artifact as returned by the nearby query.
///
/// Read-only snapshot; descriptive fields are passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ArtifactRecord", into = "ArtifactRecord")]
pub struct Artifact {
    pub id: ArtifactId,
    pub artifact_type: ArtifactType,
    pub status: ArtifactStatus,
    pub location: GeoPoint,
    pub view_distance: ViewDistance,

    pub title: String,
    pub description: Option<String>,
    pub creator_id: Option<u64>,
    pub asset_type: Option<AssetType>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub address: Option<String>,
    pub anchor_mode: AnchorMode,
    pub scale_factor: f64,
    pub asset_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub preview_url: Option<String>,
    pub is_open_now: bool,
    pub is_featured: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Artifact {
    /// A minimal published artifact, mostly for fixtures and tests.
    pub fn new(
        id: ArtifactId,
        artifact_type: ArtifactType,
        location: GeoPoint,
        view_distance: ViewDistance,
    ) -> Self {
        Self {
            id,
            artifact_type,
            status: ArtifactStatus::Published,
            location,
            view_distance,
            title: format!("Artifact {}", id),
            description: None,
            creator_id: None,
            asset_type: None,
            category: None,
            tags: Vec::new(),
            address: None,
            anchor_mode: AnchorMode::Gps,
            scale_factor: 1.0,
            asset_url: None,
            thumbnail_url: None,
            preview_url: None,
            is_open_now: true,
            is_featured: false,
            created_at: None,
            published_at: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_status(mut self, status: ArtifactStatus) -> Self {
        self.status = status;
        self
    }

    #[inline]
    pub fn is_published(&self) -> bool {
        self.status == ArtifactStatus::Published
    }
}

/// Wire shape of an artifact.
///
/// Enum fields are kept as strings so that one record with an unknown tag
/// can be dropped without failing the whole page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ArtifactRecord {
    id: ArtifactId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    creator_id: Option<u64>,
    artifact_type: String,
    #[serde(default)]
    asset_type: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    address: Option<String>,
    #[serde(default = "default_min_view_distance")]
    min_view_distance: f64,
    #[serde(default = "default_max_view_distance")]
    max_view_distance: f64,
    #[serde(default)]
    anchor_mode: Option<String>,
    #[serde(default = "default_scale_factor")]
    scale_factor: f64,
    #[serde(default)]
    asset_url: Option<String>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    preview_url: Option<String>,
    #[serde(default = "default_true")]
    is_open_now: bool,
    #[serde(default = "default_status")]
    status: String,
    #[serde(default)]
    is_featured: bool,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
}

impl ArtifactRecord {
    pub(crate) fn id(&self) -> ArtifactId {
        self.id
    }
}

fn default_min_view_distance() -> f64 {
    DEFAULT_MIN_VIEW_DISTANCE
}

fn default_max_view_distance() -> f64 {
    DEFAULT_MAX_VIEW_DISTANCE
}

fn default_scale_factor() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

// The nearby endpoint only returns published artifacts
fn default_status() -> String {
    ArtifactStatus::Published.as_str().to_string()
}

impl TryFrom<ArtifactRecord> for Artifact {
    type Error = ArtifactError;

    fn try_from(r: ArtifactRecord) -> Result<Self, Self::Error> {
        let location = GeoPoint::new(r.latitude, r.longitude)?;
        let view_distance = ViewDistance::new(r.min_view_distance, r.max_view_distance)?;
        let artifact_type: ArtifactType = r.artifact_type.parse()?;
        let status: ArtifactStatus = r.status.parse()?;
        let asset_type = r
            .asset_type
            .as_deref()
            .map(str::parse::<AssetType>)
            .transpose()?;
        let anchor_mode = r
            .anchor_mode
            .as_deref()
            .map(str::parse::<AnchorMode>)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            id: r.id,
            artifact_type,
            status,
            location,
            view_distance,
            title: r.title,
            description: r.description,
            creator_id: r.creator_id,
            asset_type,
            category: r.category,
            tags: r.tags.unwrap_or_default(),
            address: r.address,
            anchor_mode,
            scale_factor: r.scale_factor,
            asset_url: r.asset_url,
            thumbnail_url: r.thumbnail_url,
            preview_url: r.preview_url,
            is_open_now: r.is_open_now,
            is_featured: r.is_featured,
            created_at: r.created_at.as_deref().and_then(parse_timestamp),
            published_at: r.published_at.as_deref().and_then(parse_timestamp),
        })
    }
}

impl From<Artifact> for ArtifactRecord {
    fn from(a: Artifact) -> Self {
        Self {
            id: a.id,
            title: a.title,
            description: a.description,
            creator_id: a.creator_id,
            artifact_type: a.artifact_type.as_str().to_string(),
            asset_type: a.asset_type.map(|t| t.as_str().to_string()),
            category: a.category,
            tags: Some(a.tags),
            latitude: a.location.latitude(),
            longitude: a.location.longitude(),
            address: a.address,
            min_view_distance: a.view_distance.min(),
            max_view_distance: a.view_distance.max(),
            anchor_mode: Some(a.anchor_mode.as_str().to_string()),
            scale_factor: a.scale_factor,
            asset_url: a.asset_url,
            thumbnail_url: a.thumbnail_url,
            preview_url: a.preview_url,
            is_open_now: a.is_open_now,
            status: a.status.as_str().to_string(),
            is_featured: a.is_featured,
            created_at: a.created_at.map(|t| t.to_rfc3339()),
            published_at: a.published_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Parse a server timestamp, with or without an offset.
///
/// Offset-less timestamps are taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPACE_NEEDLE_JSON: &str = r#"{
        "id": 1,
        "title": "Seattle Space Needle",
        "creator_id": 7,
        "artifact_type": "art",
        "asset_type": "model_3d",
        "category": "Landmark",
        "tags": ["seattle", "landmark"],
        "latitude": 47.6205,
        "longitude": -122.3493,
        "address": "400 Broad St, Seattle, WA 98109",
        "min_view_distance": 10,
        "max_view_distance": 500,
        "anchor_mode": "gps",
        "scale_factor": 0.1,
        "asset_url": "/uploads/models/space_needle.glb",
        "is_open_now": true,
        "status": "published",
        "is_featured": true,
        "report_count": 0,
        "created_at": "2024-05-01T12:00:00.123456",
        "distance_meters": 12.5,
        "is_in_range": true,
        "is_locked": false
    }"#;

    #[test]
    fn test_view_distance_requires_min_below_max() {
        assert!(ViewDistance::new(5.0, 50.0).is_ok());
        assert!(ViewDistance::new(0.0, 0.1).is_ok());
        assert!(ViewDistance::new(50.0, 50.0).is_err());
        assert!(ViewDistance::new(60.0, 50.0).is_err());
        assert!(ViewDistance::new(-1.0, 50.0).is_err());
        assert!(ViewDistance::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_deserialize_full_record() {
        let artifact: Artifact = serde_json::from_str(SPACE_NEEDLE_JSON).unwrap();

        assert_eq!(artifact.id, 1);
        assert_eq!(artifact.artifact_type, ArtifactType::Art);
        assert_eq!(artifact.asset_type, Some(AssetType::Model3d));
        assert_eq!(artifact.view_distance.min(), 10.0);
        assert_eq!(artifact.view_distance.max(), 500.0);
        assert_eq!(artifact.location.latitude(), 47.6205);
        assert_eq!(artifact.tags, vec!["seattle", "landmark"]);
        assert!(artifact.is_published());
        assert!(artifact.created_at.is_some(), "Naive timestamps parse as UTC");
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let json = r#"{"id": 3, "artifact_type": "menu", "latitude": 1.0, "longitude": 2.0}"#;
        let artifact: Artifact = serde_json::from_str(json).unwrap();

        assert_eq!(artifact.view_distance, ViewDistance::default());
        assert_eq!(artifact.anchor_mode, AnchorMode::Gps);
        assert_eq!(artifact.status, ArtifactStatus::Published);
        assert!(artifact.tags.is_empty());
        assert!(artifact.is_open_now);
    }

    #[test]
    fn test_invalid_band_rejected() {
        let json = r#"{"id": 3, "artifact_type": "menu", "latitude": 1.0, "longitude": 2.0,
                       "min_view_distance": 80, "max_view_distance": 50}"#;
        assert!(serde_json::from_str::<Artifact>(json).is_err());
    }

    #[test]
    fn test_out_of_range_location_rejected() {
        let json = r#"{"id": 3, "artifact_type": "menu", "latitude": 91.0, "longitude": 2.0}"#;
        assert!(serde_json::from_str::<Artifact>(json).is_err());
    }

    #[test]
    fn test_serialize_uses_flat_wire_shape() {
        let artifact: Artifact = serde_json::from_str(SPACE_NEEDLE_JSON).unwrap();
        let value = serde_json::to_value(&artifact).unwrap();

        assert_eq!(value["latitude"], 47.6205);
        assert_eq!(value["artifact_type"], "art");
        assert_eq!(value["min_view_distance"], 10.0);
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2024-05-01T12:00:00Z").is_some());
        assert!(parse_timestamp("2024-05-01T12:00:00+02:00").is_some());
        assert!(parse_timestamp("2024-05-01T12:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
