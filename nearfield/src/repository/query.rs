//! Query keys, pagination and wire requests.

use std::fmt;

use super::error::FetchError;
use crate::artifact::TypeFilter;
use crate::geo::{GeoPoint, QuantizedPoint};
use crate::viewport::Viewport;

/// Largest radius the endpoint accepts.
pub const MAX_RADIUS_M: u32 = 5000;

/// Radius used when the caller does not pick one.
pub const DEFAULT_RADIUS_M: u32 = 1000;

/// Largest page the endpoint returns.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Page size used when the caller does not pick one.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Decimal places kept when keying a center (~11 m at 4).
pub const DEFAULT_CENTER_PRECISION: u8 = 4;

/// Finest center grid supported.
pub const MAX_CENTER_PRECISION: u8 = 9;

/// Canonical identity of a nearby query, used for dedup and caching.
///
/// Equal keys denote equivalent queries. The center is quantized before
/// keying and the type filter is a sorted set, so incidental differences
/// (sub-grid jitter, filter order) do not produce distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    center: QuantizedPoint,
    radius_meters: u32,
    types: TypeFilter,
}

impl QueryKey {
    /// Build a key, snapping `center` to `precision` decimal places.
    pub fn new(center: GeoPoint, radius_meters: u32, types: TypeFilter, precision: u8) -> Self {
        Self {
            center: center.quantize(precision.min(MAX_CENTER_PRECISION)),
            radius_meters,
            types,
        }
    }

    /// Key for a settled viewport.
    pub fn for_viewport(viewport: &Viewport, types: TypeFilter, precision: u8) -> Self {
        Self::new(viewport.center, viewport.radius_meters, types, precision)
    }

    /// The quantized center.
    pub fn center(&self) -> GeoPoint {
        self.center.center()
    }

    pub fn radius_meters(&self) -> u32 {
        self.radius_meters
    }

    pub fn types(&self) -> &TypeFilter {
        &self.types
    }

    /// Same area, different type filter.
    pub fn with_types(&self, types: TypeFilter) -> Self {
        Self {
            types,
            ..self.clone()
        }
    }

    /// Check the radius against the endpoint's limits.
    pub fn validate(&self) -> Result<(), FetchError> {
        if self.radius_meters == 0 {
            return Err(FetchError::InvalidQuery(
                "radius must be greater than zero".to_string(),
            ));
        }
        if self.radius_meters > MAX_RADIUS_M {
            return Err(FetchError::InvalidQuery(format!(
                "radius {} m exceeds the {} m maximum",
                self.radius_meters, MAX_RADIUS_M
            )));
        }
        Ok(())
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} r={}m types={}",
            self.center, self.radius_meters, self.types
        )
    }
}

/// A window into a result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Page {
    /// The first page of `limit` results.
    pub fn first(limit: u32) -> Self {
        Self { skip: 0, limit }
    }

    /// The page immediately after this one.
    pub fn next(&self) -> Self {
        Self {
            skip: self.skip.saturating_add(self.limit),
            limit: self.limit,
        }
    }

    #[inline]
    pub fn is_first(&self) -> bool {
        self.skip == 0
    }

    /// Check the limit against the endpoint's bounds.
    pub fn validate(&self) -> Result<(), FetchError> {
        if !(1..=MAX_PAGE_LIMIT).contains(&self.limit) {
            return Err(FetchError::InvalidQuery(format!(
                "limit {} must be between 1 and {}",
                self.limit, MAX_PAGE_LIMIT
            )));
        }
        Ok(())
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_LIMIT)
    }
}

/// A query key together with the page to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NearbyQuery {
    pub key: QueryKey,
    pub page: Page,
}

impl NearbyQuery {
    pub fn new(key: QueryKey, page: Page) -> Self {
        Self { key, page }
    }

    /// The first page for a key.
    pub fn first_page(key: QueryKey, limit: u32) -> Self {
        Self::new(key, Page::first(limit))
    }

    pub fn validate(&self) -> Result<(), FetchError> {
        self.key.validate()?;
        self.page.validate()
    }

    /// The outbound request for this query.
    pub fn to_request(&self) -> NearbyRequest {
        NearbyRequest {
            center: self.key.center(),
            radius_meters: self.key.radius_meters,
            types: self.key.types.clone(),
            page: self.page,
        }
    }
}

impl fmt::Display for NearbyQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} skip={} limit={}",
            self.key, self.page.skip, self.page.limit
        )
    }
}

/// Parameters sent to `GET /artifacts/near`.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyRequest {
    pub center: GeoPoint,
    pub radius_meters: u32,
    pub types: TypeFilter,
    pub page: Page,
}

impl NearbyRequest {
    /// Query string pairs in the endpoint's parameter names.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("lat", self.center.latitude().to_string()),
            ("lng", self.center.longitude().to_string()),
            ("radius", self.radius_meters.to_string()),
            ("skip", self.page.skip.to_string()),
            ("limit", self.page.limit.to_string()),
        ];
        if let Some(types) = self.types.to_query_param() {
            pairs.push(("types", types));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactType;

    fn seattle() -> GeoPoint {
        GeoPoint::new(47.6205, -122.3493).unwrap()
    }

    #[test]
    fn test_nearby_centers_share_a_key() {
        let a = QueryKey::new(seattle(), 1000, TypeFilter::all(), 4);
        let b = QueryKey::new(
            GeoPoint::new(47.62052, -122.34931).unwrap(),
            1000,
            TypeFilter::all(),
            4,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_filter_order_does_not_matter() {
        let a = QueryKey::new(
            seattle(),
            1000,
            TypeFilter::only([ArtifactType::Menu, ArtifactType::Art]),
            4,
        );
        let b = QueryKey::new(
            seattle(),
            1000,
            TypeFilter::only([ArtifactType::Art, ArtifactType::Menu]),
            4,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_radius_and_types_distinguish_keys() {
        let base = QueryKey::new(seattle(), 1000, TypeFilter::all(), 4);
        assert_ne!(base, QueryKey::new(seattle(), 2000, TypeFilter::all(), 4));
        assert_ne!(
            base,
            base.with_types(TypeFilter::only([ArtifactType::Art]))
        );
    }

    #[test]
    fn test_radius_validation() {
        let key = |r| QueryKey::new(seattle(), r, TypeFilter::all(), 4);
        assert!(key(1).validate().is_ok());
        assert!(key(MAX_RADIUS_M).validate().is_ok());
        assert!(matches!(
            key(0).validate(),
            Err(FetchError::InvalidQuery(_))
        ));
        assert!(matches!(
            key(MAX_RADIUS_M + 1).validate(),
            Err(FetchError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_page_validation_and_next() {
        assert!(Page::first(0).validate().is_err());
        assert!(Page::first(101).validate().is_err());
        assert!(Page::default().validate().is_ok());

        let next = Page::first(50).next();
        assert_eq!(next, Page { skip: 50, limit: 50 });
        assert!(!next.is_first());
    }

    #[test]
    fn test_query_pairs_use_endpoint_names() {
        let key = QueryKey::new(seattle(), 1000, TypeFilter::only([ArtifactType::Art]), 4);
        let request = NearbyQuery::first_page(key, 50).to_request();
        let pairs = request.query_pairs();

        assert!(pairs.contains(&("lat", "47.6205".to_string())));
        assert!(pairs.contains(&("lng", "-122.3493".to_string())));
        assert!(pairs.contains(&("radius", "1000".to_string())));
        assert!(pairs.contains(&("types", "art".to_string())));
        assert!(pairs.contains(&("skip", "0".to_string())));
    }

    #[test]
    fn test_all_types_omits_types_param() {
        let key = QueryKey::new(seattle(), 1000, TypeFilter::all(), 4);
        let pairs = NearbyQuery::first_page(key, 50).to_request().query_pairs();
        assert!(pairs.iter().all(|(name, _)| *name != "types"));
    }
}
