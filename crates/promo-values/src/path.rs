//! Dot-delimited paths into a values document
//!
//! Provides [`ValuePath`] for addressing nested scalars, e.g. `image.tag`
//! or `containers.0.image`.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Path to a node in a values document
///
/// Segments are mapping keys, or zero-based indices when the node they
/// address is a sequence. Whether a segment is an index is decided by the
/// document, not by the path.
///
/// # Examples
/// - `image.tag` → `["image", "tag"]`
/// - `sidecars.1.image` → `["sidecars", "1", "image"]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValuePath(Vec<String>);

impl ValuePath {
    /// Create path from segments
    ///
    /// # Errors
    /// Returns error if there are no segments or any segment is empty
    pub fn new(segments: Vec<String>) -> Result<Self, PathError> {
        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        if segments.iter().any(String::is_empty) {
            return Err(PathError::EmptySegment);
        }
        Ok(Self(segments))
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; paths have at least one segment
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Last segment
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Path made of the first `len` segments, rendered with dots
    #[must_use]
    pub fn prefix(&self, len: usize) -> String {
        self.0[..len.min(self.0.len())].join(".")
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Display for ValuePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for ValuePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::Empty);
        }
        Self::new(s.split('.').map(str::to_string).collect())
    }
}

/// Errors related to value paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// No segments at all
    #[error("path is empty")]
    Empty,

    /// Empty segment in path (`a..b`, `.a`, `a.`)
    #[error("path contains empty segment")]
    EmptySegment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_from_str_valid() {
        let path: ValuePath = "image.tag".parse().unwrap();
        assert_eq!(path.segments(), &["image", "tag"]);
        assert_eq!(path.len(), 2);
        assert_eq!(path.last(), Some("tag"));
    }

    #[test]
    fn path_keeps_numeric_segments_as_text() {
        let path: ValuePath = "sidecars.0.image".parse().unwrap();
        assert_eq!(path.segments(), &["sidecars", "0", "image"]);
    }

    #[test]
    fn path_allows_non_identifier_keys() {
        let path: ValuePath = "app-config.image_ref".parse().unwrap();
        assert_eq!(path.segments(), &["app-config", "image_ref"]);
    }

    #[test]
    fn path_from_str_empty() {
        assert_eq!("".parse::<ValuePath>(), Err(PathError::Empty));
        assert_eq!(ValuePath::new(Vec::new()), Err(PathError::Empty));
    }

    #[test]
    fn path_from_str_empty_segment() {
        assert_eq!("a..b".parse::<ValuePath>(), Err(PathError::EmptySegment));
        assert_eq!(".a".parse::<ValuePath>(), Err(PathError::EmptySegment));
        assert_eq!("a.".parse::<ValuePath>(), Err(PathError::EmptySegment));
    }

    #[test]
    fn path_prefix_and_display() {
        let path: ValuePath = "a.b.c".parse().unwrap();
        assert_eq!(path.prefix(2), "a.b");
        assert_eq!(path.prefix(10), "a.b.c");
        assert_eq!(path.to_string(), "a.b.c");
    }
}
