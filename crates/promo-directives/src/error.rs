//! Error types for promotion steps
//!
//! Hierarchy:
//! - [`ValidationError`]: raw config rejected by the step's schema
//! - [`ResolveError`]: image updates could not be generated from Freight
//! - [`StepError`]: everything a step run can fail with

use promo_freight::{FreightOrigin, StoreError};
use promo_values::PatchError;

/// Raw config violates the step's schema
///
/// Holds every violation, each rendered as `"<location>: <message>"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {step} config: {}", problems.join("; "))]
pub struct ValidationError {
    pub step: String,
    pub problems: Vec<String>,
}

impl ValidationError {
    pub fn new(step: impl Into<String>, problems: Vec<String>) -> Self {
        Self {
            step: step.into(),
            problems,
        }
    }
}

/// Image update resolution failures
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Fetching a Warehouse failed; aborts the whole resolution
    #[error("error getting Warehouse {origin}: {source}")]
    Store {
        origin: FreightOrigin,
        #[source]
        source: StoreError,
    },

    /// No eligible origin carries the image
    #[error("image {image} not found in referenced Freight")]
    NotFound { image: String },
}

impl ResolveError {
    pub fn store(origin: &FreightOrigin, source: StoreError) -> Self {
        Self::Store {
            origin: origin.clone(),
            source,
        }
    }
}

/// Errors from running a promotion step
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Validated config did not map onto the typed config
    #[error("could not convert config into {step} config: {source}")]
    Conversion {
        step: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to generate image updates: {0}")]
    ImageUpdates(#[source] ResolveError),

    #[error("values file update failed: {0}")]
    ValuesUpdate(#[source] PatchError),
}

impl StepError {
    pub fn conversion(step: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Conversion {
            step: step.into(),
            source,
        }
    }
}
