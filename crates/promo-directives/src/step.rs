//! Promotion step contract and registry

use crate::config::Config;
use crate::context::PromotionStepContext;
use crate::error::StepError;
use crate::helm_image_updater::HelmImageUpdater;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome reported to the promotion engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromotionStatus {
    Succeeded,
    Errored,
}

/// Status plus named outputs for downstream steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionStepResult {
    pub status: PromotionStatus,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub output: BTreeMap<String, serde_json::Value>,
}

impl PromotionStepResult {
    #[must_use]
    pub fn succeeded() -> Self {
        Self {
            status: PromotionStatus::Succeeded,
            output: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn errored() -> Self {
        Self {
            status: PromotionStatus::Errored,
            output: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_output(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.output.insert(key.into(), value.into());
        self
    }

    /// `commitMessage` output, if the step produced one
    #[must_use]
    pub fn commit_message(&self) -> Option<&str> {
        self.output
            .get(crate::COMMIT_MESSAGE_KEY)
            .and_then(serde_json::Value::as_str)
    }
}

impl From<&StepError> for PromotionStepResult {
    fn from(_: &StepError) -> Self {
        Self::errored()
    }
}

/// A named unit of work in a promotion
#[async_trait]
pub trait PromotionStep: Send + Sync {
    /// Name the step is addressed by
    fn name(&self) -> &'static str;

    /// Validate `config`, then run the step
    ///
    /// # Errors
    /// Any failure is terminal for the invocation; the caller reports it as
    /// `PromotionStatus::Errored`.
    async fn run(
        &self,
        ctx: &PromotionStepContext,
        config: &Config,
    ) -> Result<PromotionStepResult, StepError>;
}

/// Steps by name
pub struct StepRegistry {
    steps: BTreeMap<&'static str, Box<dyn PromotionStep>>,
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepRegistry")
            .field("steps", &self.names())
            .finish()
    }
}

impl StepRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: BTreeMap::new(),
        }
    }

    /// Register a step, replacing any step with the same name
    pub fn register<S: PromotionStep + 'static>(&mut self, step: S) {
        self.steps.insert(step.name(), Box::new(step));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn PromotionStep> {
        self.steps.get(name).map(|s| &**s)
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.steps.keys().copied().collect()
    }
}

/// Registry with every built-in step
#[must_use]
pub fn default_steps() -> StepRegistry {
    let mut registry = StepRegistry::new();
    registry.register(HelmImageUpdater::new());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HELM_UPDATE_IMAGE;

    #[test]
    fn default_registry_has_helm_update_image() {
        let registry = default_steps();
        assert_eq!(registry.names(), vec![HELM_UPDATE_IMAGE]);
        assert_eq!(
            registry.get(HELM_UPDATE_IMAGE).map(|s| s.name()),
            Some(HELM_UPDATE_IMAGE)
        );
        assert!(registry.get("git-commit").is_none());
    }

    #[test]
    fn result_serializes_like_engine_expects() {
        let result =
            PromotionStepResult::succeeded().with_output("commitMessage", "Updated values.yaml");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({
                "status": "Succeeded",
                "output": {"commitMessage": "Updated values.yaml"}
            })
        );
        assert_eq!(result.commit_message(), Some("Updated values.yaml"));

        let errored = serde_json::to_value(PromotionStepResult::errored()).unwrap();
        assert_eq!(errored, serde_json::json!({"status": "Errored"}));
    }
}
