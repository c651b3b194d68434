//! Value kinds for image-backed updates

use promo_freight::Image;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Which part of a Freight image is written to the values file
///
/// Tokens outside the known set are kept as [`ValueKind::Literal`] and
/// written verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `repo:tag`
    ImageAndTag,
    /// `tag`
    Tag,
    /// `repo@digest`
    ImageAndDigest,
    /// `digest`
    Digest,
    /// Unrecognized token, echoed unchanged
    Literal(String),
}

impl ValueKind {
    /// Parse a token; never fails
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token {
            "ImageAndTag" => Self::ImageAndTag,
            "Tag" => Self::Tag,
            "ImageAndDigest" => Self::ImageAndDigest,
            "Digest" => Self::Digest,
            other => Self::Literal(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ImageAndTag => "ImageAndTag",
            Self::Tag => "Tag",
            Self::ImageAndDigest => "ImageAndDigest",
            Self::Digest => "Digest",
            Self::Literal(token) => token,
        }
    }

    /// Render the value to write for an image
    #[must_use]
    pub fn format(&self, image: &Image) -> String {
        match self {
            Self::ImageAndTag => format!("{}:{}", image.repo_url, image.tag),
            Self::Tag => image.tag.clone(),
            Self::ImageAndDigest => format!("{}@{}", image.repo_url, image.digest),
            Self::Digest => image.digest.clone(),
            Self::Literal(token) => token.clone(),
        }
    }
}

/// Render the value for `token` from a Freight image
#[must_use]
pub fn format_value(image: &Image, token: &str) -> String {
    ValueKind::parse(token).format(image)
}

impl FromStr for ValueKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ValueKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ValueKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Self::parse(&token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn nginx() -> Image {
        Image::new("docker.io/library/nginx")
            .with_tag("1.19.0")
            .with_digest("sha256:abcdef1234567890")
    }

    #[test]
    fn formats_known_kinds() {
        let image = nginx();
        assert_eq!(format_value(&image, "ImageAndTag"), "docker.io/library/nginx:1.19.0");
        assert_eq!(format_value(&image, "Tag"), "1.19.0");
        assert_eq!(
            format_value(&image, "ImageAndDigest"),
            "docker.io/library/nginx@sha256:abcdef1234567890"
        );
        assert_eq!(format_value(&image, "Digest"), "sha256:abcdef1234567890");
    }

    // Schema-valid configs never reach this with an image set, but a
    // malformed token must still not fail: it is written as-is.
    #[test]
    fn unrecognized_token_passes_through() {
        assert_eq!(format_value(&nginx(), "Unknown"), "Unknown");
        assert_eq!(format_value(&nginx(), "tag"), "tag");
        assert_eq!(ValueKind::parse(""), ValueKind::Literal(String::new()));
    }

    #[test]
    fn empty_fields_format_empty() {
        let image = Image::new("docker.io/library/nginx");
        assert_eq!(format_value(&image, "Tag"), "");
        assert_eq!(format_value(&image, "ImageAndTag"), "docker.io/library/nginx:");
    }

    #[test]
    fn serde_uses_tokens() {
        let kind: ValueKind = serde_json::from_str("\"ImageAndDigest\"").unwrap();
        assert_eq!(kind, ValueKind::ImageAndDigest);
        assert_eq!(serde_json::to_string(&ValueKind::Tag).unwrap(), "\"Tag\"");
    }

    proptest! {
        #[test]
        fn unknown_tokens_echo(token in "[A-Za-z0-9._-]{0,16}") {
            prop_assume!(!matches!(token.as_str(), "ImageAndTag" | "Tag" | "ImageAndDigest" | "Digest"));
            prop_assert_eq!(format_value(&nginx(), &token), token);
        }
    }
}
