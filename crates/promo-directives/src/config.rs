//! helm-update-image configuration
//!
//! Raw step configuration arrives untyped as a [`Config`]. After schema
//! validation it is converted into [`HelmUpdateImageConfig`], whose entries
//! are then split into [`ImageUpdate`] cases so that resolution never has to
//! re-check which optional fields are set.

use crate::value::ValueKind;
use serde::{Deserialize, Serialize};

/// Untyped step configuration
pub type Config = serde_json::Map<String, serde_json::Value>;

/// Typed helm-update-image configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmUpdateImageConfig {
    /// Values file, relative to the work dir
    pub path: String,
    /// Entries in application order
    pub images: Vec<HelmUpdateImageConfigImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmUpdateImageConfigImage {
    /// Dot path in the values file
    pub key: String,
    /// Literal, or a value-kind token when `image` is set
    pub value: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_origin: Option<FromOrigin>,
}

/// Origin override for a single entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FromOrigin {
    pub kind: String,
    pub name: String,
}

impl HelmUpdateImageConfig {
    /// Convert a validated raw config
    ///
    /// # Errors
    /// Returns the deserialization error if the shape does not match
    pub fn from_config(config: &Config) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(config.clone()))
    }

    /// Entries as tagged updates, in declaration order
    #[must_use]
    pub fn updates(&self) -> Vec<ImageUpdate> {
        self.images.iter().map(ImageUpdate::from).collect()
    }
}

/// One entry after the image/literal split
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageUpdate {
    /// Value comes from a Freight image
    Matched {
        key: String,
        image: String,
        kind: ValueKind,
        from_origin: Option<FromOrigin>,
    },
    /// Value is written as given
    Literal { key: String, value: String },
}

impl ImageUpdate {
    /// Values file key this update writes
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Matched { key, .. } | Self::Literal { key, .. } => key,
        }
    }
}

impl From<&HelmUpdateImageConfigImage> for ImageUpdate {
    fn from(entry: &HelmUpdateImageConfigImage) -> Self {
        if entry.image.is_empty() {
            Self::Literal {
                key: entry.key.clone(),
                value: entry.value.clone(),
            }
        } else {
            Self::Matched {
                key: entry.key.clone(),
                image: entry.image.clone(),
                kind: ValueKind::parse(&entry.value),
                from_origin: entry.from_origin.clone(),
            }
        }
    }
}
