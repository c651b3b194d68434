//! Promotion steps
//!
//! Steps take untyped config plus a [`PromotionStepContext`] and return a
//! [`PromotionStepResult`]. The only step so far is `helm-update-image`:
//!
//! 1. Validate the config against its JSON schema
//! 2. Resolve each entry to a value, from Freight whose Warehouse
//!    subscribes to the image, or from the literal in the config
//! 3. Patch the values file in place
//! 4. Report a commit message for the change
//!
//! # Example
//!
//! ```rust,no_run
//! use promo_directives::{default_steps, Config, PromotionStepContext, HELM_UPDATE_IMAGE};
//! use promo_freight::InMemoryWarehouseStore;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = default_steps();
//! let step = registry.get(HELM_UPDATE_IMAGE).ok_or("unknown step")?;
//!
//! let ctx = PromotionStepContext::new("my-project", "/work", Arc::new(InMemoryWarehouseStore::new()));
//! let config: Config = serde_json::from_str(
//!     r#"{"path": "values.yaml", "images": [{"key": "image.tag", "value": "1.19.0"}]}"#,
//! )?;
//!
//! let result = step.run(&ctx, &config).await?;
//! println!("{:?}", result.commit_message());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod commit;
mod config;
mod context;
mod error;
mod helm_image_updater;
mod origin;
mod resolver;
mod schema;
mod step;
mod value;

pub use commit::commit_message;
pub use config::{Config, FromOrigin, HelmUpdateImageConfig, HelmUpdateImageConfigImage, ImageUpdate};
pub use context::{cancellation, CancellationHandle, CancellationSignal, PromotionStepContext};
pub use error::{ResolveError, StepError, ValidationError};
pub use helm_image_updater::{HelmImageUpdater, COMMIT_MESSAGE_KEY, HELM_UPDATE_IMAGE};
pub use origin::{desired_origin, eligible_origins};
pub use resolver::ImageUpdateResolver;
pub use schema::validate_config;
pub use step::{default_steps, PromotionStatus, PromotionStep, PromotionStepResult, StepRegistry};
pub use value::{format_value, ValueKind};
