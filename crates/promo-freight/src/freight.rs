//! Freight records
//!
//! A Freight record is an immutable snapshot of artifacts a Warehouse
//! produced. Promotion steps never mutate these; they only read them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// Kind of the only origin type currently produced
pub const WAREHOUSE_KIND: &str = "Warehouse";

/// Source of a Freight record
///
/// Keyed as `kind/name` inside a [`FreightCollection`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FreightOrigin {
    /// Origin kind (e.g. `Warehouse`)
    pub kind: String,
    /// Origin name, unique within a project
    pub name: String,
}

impl FreightOrigin {
    /// Create origin from kind and name
    #[inline]
    #[must_use]
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a Warehouse origin
    #[inline]
    #[must_use]
    pub fn warehouse(name: impl Into<String>) -> Self {
        Self::new(WAREHOUSE_KIND, name)
    }

    /// Collection key: `kind/name`
    #[inline]
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }
}

impl Display for FreightOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// A container image recorded in Freight
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Repository reference, e.g. `docker.io/library/nginx`
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    /// Tag, if the image was discovered by tag
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
    /// Content digest, e.g. `sha256:...`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub digest: String,
}

impl Image {
    /// Create image record for repository
    #[inline]
    #[must_use]
    pub fn new(repo_url: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            ..Self::default()
        }
    }

    /// Set tag
    #[inline]
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Set digest
    #[inline]
    #[must_use]
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = digest.into();
        self
    }
}

/// Artifacts one origin contributed to a promotion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreightReference {
    /// Where the artifacts came from
    pub origin: FreightOrigin,
    /// Images in declaration order
    #[serde(default)]
    pub images: Vec<Image>,
}

impl FreightReference {
    /// Create empty reference for origin
    #[inline]
    #[must_use]
    pub fn new(origin: FreightOrigin) -> Self {
        Self {
            origin,
            images: Vec::new(),
        }
    }

    /// Append an image
    #[inline]
    #[must_use]
    pub fn with_image(mut self, image: Image) -> Self {
        self.images.push(image);
        self
    }

    /// First image whose repository matches exactly
    #[must_use]
    pub fn find_image(&self, repo_url: &str) -> Option<&Image> {
        self.images.iter().find(|i| i.repo_url == repo_url)
    }
}

/// All Freight available to a promotion, keyed by `kind/name`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FreightCollection {
    freight: BTreeMap<String, FreightReference>,
}

impl FreightCollection {
    /// Create empty collection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert reference under its origin key, replacing any previous one
    pub fn insert(&mut self, reference: FreightReference) -> Option<FreightReference> {
        self.freight.insert(reference.origin.key(), reference)
    }

    /// Builder-style insert
    #[inline]
    #[must_use]
    pub fn with(mut self, reference: FreightReference) -> Self {
        self.insert(reference);
        self
    }

    /// Look up the reference contributed by `origin`
    #[inline]
    #[must_use]
    pub fn get(&self, origin: &FreightOrigin) -> Option<&FreightReference> {
        self.freight.get(&origin.key())
    }

    /// All references, ordered by origin key
    pub fn references(&self) -> impl Iterator<Item = &FreightReference> {
        self.freight.values()
    }

    /// Number of origins with Freight
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.freight.len()
    }

    /// Check if collection is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.freight.is_empty()
    }
}

impl FromIterator<FreightReference> for FreightCollection {
    fn from_iter<I: IntoIterator<Item = FreightReference>>(iter: I) -> Self {
        let mut collection = Self::new();
        for reference in iter {
            collection.insert(reference);
        }
        collection
    }
}

/// An origin a promotion is allowed to draw Freight from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreightRequest {
    /// Requested origin
    pub origin: FreightOrigin,
}

impl FreightRequest {
    /// Request Freight from origin
    #[inline]
    #[must_use]
    pub fn new(origin: FreightOrigin) -> Self {
        Self { origin }
    }
}
