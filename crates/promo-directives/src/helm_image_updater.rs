//! helm-update-image step
//!
//! Writes Freight-backed image references (or literal values) into a Helm
//! values file in the work dir, and reports a commit message describing
//! the change.

use crate::commit::commit_message;
use crate::config::{Config, HelmUpdateImageConfig};
use crate::context::PromotionStepContext;
use crate::error::{StepError, ValidationError};
use crate::resolver::ImageUpdateResolver;
use crate::schema::validate_config;
use crate::step::{PromotionStep, PromotionStepResult};
use async_trait::async_trait;
use promo_values::{secure_join, update_values_file};
use tracing::{error, info, instrument};

/// Name of the step
pub const HELM_UPDATE_IMAGE: &str = "helm-update-image";

/// Output key holding the commit message
pub const COMMIT_MESSAGE_KEY: &str = "commitMessage";

#[derive(Debug, Clone, Copy, Default)]
pub struct HelmImageUpdater;

impl HelmImageUpdater {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate raw config against the step schema
    ///
    /// # Errors
    /// Returns every schema violation
    pub fn validate(&self, config: &Config) -> Result<(), ValidationError> {
        validate_config(HELM_UPDATE_IMAGE, config)
    }

    /// Run with an already typed config
    ///
    /// Resolution runs to completion before the values file is touched, so a
    /// failed resolution never leaves a partial edit behind. On success the
    /// result carries `commitMessage` unless nothing changed.
    ///
    /// # Errors
    /// - `StepError::ImageUpdates` if resolution fails
    /// - `StepError::ValuesUpdate` if the values file cannot be patched
    #[instrument(skip_all, fields(project = %ctx.project, path = %config.path))]
    pub async fn run_promotion_step(
        &self,
        ctx: &PromotionStepContext,
        config: &HelmUpdateImageConfig,
    ) -> Result<PromotionStepResult, StepError> {
        let changes = ImageUpdateResolver::from_context(ctx)
            .resolve(&config.updates(), &ctx.allowed_origins(), &ctx.freight)
            .await
            .map_err(StepError::ImageUpdates)?;

        let values_file =
            secure_join(&ctx.work_dir, &config.path).map_err(StepError::ValuesUpdate)?;
        update_values_file(&values_file, &changes)
            .await
            .map_err(StepError::ValuesUpdate)?;

        let message = commit_message(&config.path, &changes);
        let mut result = PromotionStepResult::succeeded();
        if !message.is_empty() {
            result = result.with_output(COMMIT_MESSAGE_KEY, message);
        }

        info!(changes = changes.len(), "Updated values file");
        Ok(result)
    }

    async fn validate_and_run(
        &self,
        ctx: &PromotionStepContext,
        config: &Config,
    ) -> Result<PromotionStepResult, StepError> {
        self.validate(config)?;
        let typed = HelmUpdateImageConfig::from_config(config)
            .map_err(|e| StepError::conversion(HELM_UPDATE_IMAGE, e))?;
        self.run_promotion_step(ctx, &typed).await
    }
}

#[async_trait]
impl PromotionStep for HelmImageUpdater {
    fn name(&self) -> &'static str {
        HELM_UPDATE_IMAGE
    }

    async fn run(
        &self,
        ctx: &PromotionStepContext,
        config: &Config,
    ) -> Result<PromotionStepResult, StepError> {
        info!(step = HELM_UPDATE_IMAGE, project = %ctx.project, "Running promotion step");
        let outcome = self.validate_and_run(ctx, config).await;
        if let Err(e) = &outcome {
            error!(step = HELM_UPDATE_IMAGE, error = %e, "Promotion step failed");
        }
        outcome
    }
}
