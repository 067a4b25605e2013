//! Merged result set for one query key.

use std::collections::HashMap;

use super::query::Page;
use crate::artifact::{Artifact, ArtifactId, ArtifactPage};

/// All pages fetched so far for one query key, merged in order.
///
/// The first page replaces the set. Later pages append; an artifact whose
/// id is already present is replaced in place.
#[derive(Debug, Clone, Default)]
pub struct ArtifactSet {
    artifacts: Vec<Artifact>,
    index: HashMap<ArtifactId, usize>,
    last_page: Option<Page>,
    has_more: bool,
    total_count: u64,
}

impl ArtifactSet {
    /// Start a set from its first page.
    pub fn from_page(page: &ArtifactPage, at: Page) -> Self {
        let mut set = Self::default();
        set.merge(page, at);
        set
    }

    /// Merge a page fetched at `at` into the set.
    pub fn merge(&mut self, page: &ArtifactPage, at: Page) {
        if at.is_first() {
            self.artifacts.clear();
            self.index.clear();
        }
        for artifact in &page.artifacts {
            match self.index.get(&artifact.id) {
                Some(&i) => self.artifacts[i] = artifact.clone(),
                None => {
                    self.index.insert(artifact.id, self.artifacts.len());
                    self.artifacts.push(artifact.clone());
                }
            }
        }
        self.last_page = Some(at);
        self.has_more = page.has_more;
        self.total_count = page.total_count;
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn get(&self, id: ArtifactId) -> Option<&Artifact> {
        self.index.get(&id).map(|&i| &self.artifacts[i])
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Whether the server reported a further page.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Count reported with the most recent page.
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// The page to request next, if the server reported more.
    pub fn next_page(&self) -> Option<Page> {
        match self.last_page {
            Some(last) if self.has_more => Some(last.next()),
            _ => None,
        }
    }
}
