//! Artifact data model.
//!
//! Artifacts arrive from the nearby query as flat JSON records. Decoding
//! validates each record's location and view-distance band; a record that
//! fails is dropped from its page rather than repaired.

mod error;
mod filter;
mod kinds;
mod model;
mod page;

pub use error::ArtifactError;
pub use filter::TypeFilter;
pub use kinds::{AnchorMode, ArtifactStatus, ArtifactType, AssetType};
pub use model::{Artifact, ArtifactId, ViewDistance};
pub use page::ArtifactPage;
