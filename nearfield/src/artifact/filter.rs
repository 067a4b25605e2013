//! Artifact type filter.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::error::ArtifactError;
use super::kinds::ArtifactType;

/// A canonical set of artifact types. Empty means "all types".
///
/// Backed by a `BTreeSet`, so two filters naming the same types in any
/// order or with duplicates compare and hash equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeFilter(BTreeSet<ArtifactType>);

impl TypeFilter {
    /// The filter that allows every type.
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter allowing only the given types.
    pub fn only(types: impl IntoIterator<Item = ArtifactType>) -> Self {
        Self(types.into_iter().collect())
    }

    /// Parse a comma-separated tag list such as `"art,menu"`.
    ///
    /// Blank input and `"all"` produce the all-types filter. Unknown tags
    /// are rejected.
    pub fn parse(input: &str) -> Result<Self, ArtifactError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }
        trimmed
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::parse::<ArtifactType>)
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    /// True if no type restriction applies.
    #[inline]
    pub fn is_all(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether an artifact of this type passes the filter.
    #[inline]
    pub fn allows(&self, artifact_type: ArtifactType) -> bool {
        self.0.is_empty() || self.0.contains(&artifact_type)
    }

    /// Add the type if absent, remove it if present (filter chip tap).
    pub fn toggle(&mut self, artifact_type: ArtifactType) {
        if !self.0.remove(&artifact_type) {
            self.0.insert(artifact_type);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = ArtifactType> + '_ {
        self.0.iter().copied()
    }

    /// The `types` query parameter value, or `None` for all types.
    pub fn to_query_param(&self) -> Option<String> {
        if self.is_all() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return f.write_str("all");
        }
        let tags: Vec<&str> = self.0.iter().map(ArtifactType::as_str).collect();
        f.write_str(&tags.join(","))
    }
}

impl FromStr for TypeFilter {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl FromIterator<ArtifactType> for TypeFilter {
    fn from_iter<I: IntoIterator<Item = ArtifactType>>(iter: I) -> Self {
        Self::only(iter)
    }
}
