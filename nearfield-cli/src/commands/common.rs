//! Common types and utilities shared across CLI commands.

use nearfield::artifact::{Artifact, AssetType, ArtifactType, TypeFilter, ViewDistance};
use nearfield::geo::GeoPoint;
use nearfield::visibility::{format_distance, ArtifactVisibility};

use crate::error::CliError;

/// Parse a `lat,lon` pair.
pub fn parse_point(input: &str) -> Result<GeoPoint, CliError> {
    let (lat, lon) = input.split_once(',').ok_or_else(|| {
        CliError::InvalidArgument(format!("expected 'lat,lon', got '{}'", input))
    })?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| CliError::InvalidArgument(format!("invalid latitude '{}'", lat.trim())))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| CliError::InvalidArgument(format!("invalid longitude '{}'", lon.trim())))?;
    point(lat, lon)
}

/// Validate a coordinate pair.
pub fn point(lat: f64, lon: f64) -> Result<GeoPoint, CliError> {
    GeoPoint::new(lat, lon).map_err(|e| CliError::InvalidArgument(e.to_string()))
}

/// Parse a comma-separated type list (`all` or blank for every type).
pub fn parse_types(input: Option<&str>) -> Result<TypeFilter, CliError> {
    match input {
        Some(s) => TypeFilter::parse(s).map_err(|e| CliError::InvalidArgument(e.to_string())),
        None => Ok(TypeFilter::all()),
    }
}

/// Demo landmark: id, type, lat, lon, min/max view distance, title, category.
type Landmark = (u64, ArtifactType, f64, f64, f64, f64, &'static str, &'static str);

const SEATTLE_LANDMARKS: &[Landmark] = &[
    (1, ArtifactType::Art, 47.6205, -122.3493, 10.0, 500.0, "Seattle Space Needle", "Landmark"),
    (2, ArtifactType::InfoCard, 47.6085, -122.3401, 5.0, 100.0, "Pike Place Market", "Market"),
    (3, ArtifactType::Wayfinding, 47.6295, -122.3597, 5.0, 100.0, "Kerry Park Viewpoint", "Viewpoint"),
    (4, ArtifactType::Art, 47.6205, -122.3506, 5.0, 100.0, "Chihuly Garden and Glass", "Museum"),
];

/// The Seattle landmarks used by `--demo`.
pub fn demo_catalog() -> Result<Vec<Artifact>, CliError> {
    SEATTLE_LANDMARKS
        .iter()
        .map(|&(id, artifact_type, lat, lon, min, max, title, category)| {
            let band = ViewDistance::new(min, max)
                .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
            let mut artifact =
                Artifact::new(id, artifact_type, point(lat, lon)?, band).with_title(title);
            artifact.category = Some(category.to_string());
            artifact.asset_type = Some(if id == 1 {
                AssetType::Model3d
            } else {
                AssetType::Image
            });
            artifact.is_featured = id == 1;
            Ok(artifact)
        })
        .collect()
}

/// One display line for an artifact and its state.
pub fn format_row(entry: &ArtifactVisibility) -> String {
    format!(
        "{:>5}  {:<12} {:<32} {:>10}  {:<8}  {}",
        entry.artifact.id,
        entry.artifact.artifact_type.label(),
        truncate(&entry.artifact.title, 32),
        format_distance(entry.state.distance_meters),
        entry.visibility().to_string(),
        entry.guidance(),
    )
}

/// Column headings matching [`format_row`].
pub fn header() -> String {
    format!(
        "{:>5}  {:<12} {:<32} {:>10}  {:<8}  {}",
        "ID", "TYPE", "TITLE", "DISTANCE", "STATE", "GUIDANCE"
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
