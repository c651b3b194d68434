//! Warehouses
//!
//! A Warehouse declares the repositories it subscribes to. Only artifacts
//! from a subscribed repository may be trusted as coming from that Warehouse.

use serde::{Deserialize, Serialize};

/// Provenance object for a Freight origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    /// Warehouse name
    pub name: String,
    /// Project (namespace) the Warehouse lives in
    pub project: String,
    /// Declared subscriptions
    #[serde(default)]
    pub subscriptions: Vec<RepoSubscription>,
}

impl Warehouse {
    /// Create Warehouse without subscriptions
    #[inline]
    #[must_use]
    pub fn new(project: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project: project.into(),
            subscriptions: Vec::new(),
        }
    }

    /// Add a subscription
    #[inline]
    #[must_use]
    pub fn with_subscription(mut self, subscription: RepoSubscription) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    /// Repositories of all image subscriptions
    pub fn image_subscriptions(&self) -> impl Iterator<Item = &str> {
        self.subscriptions
            .iter()
            .filter_map(|s| s.image.as_ref())
            .map(|i| i.repo_url.as_str())
    }

    /// Check whether this Warehouse subscribes to the image repository
    #[must_use]
    pub fn subscribes_to_image(&self, repo_url: &str) -> bool {
        self.image_subscriptions().any(|r| r == repo_url)
    }
}

/// One subscription; exactly one field is expected to be set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSubscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSubscription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartSubscription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitSubscription>,
}

impl RepoSubscription {
    /// Image repository subscription
    #[must_use]
    pub fn image(repo_url: impl Into<String>) -> Self {
        Self {
            image: Some(ImageSubscription {
                repo_url: repo_url.into(),
            }),
            ..Self::default()
        }
    }

    /// Helm chart subscription
    #[must_use]
    pub fn chart(repo_url: impl Into<String>, name: Option<String>) -> Self {
        Self {
            chart: Some(ChartSubscription {
                repo_url: repo_url.into(),
                name,
            }),
            ..Self::default()
        }
    }

    /// Git repository subscription
    #[must_use]
    pub fn git(repo_url: impl Into<String>) -> Self {
        Self {
            git: Some(GitSubscription {
                repo_url: repo_url.into(),
            }),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSubscription {
    #[serde(rename = "repoURL")]
    pub repo_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSubscription {
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSubscription {
    #[serde(rename = "repoURL")]
    pub repo_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribes_only_to_declared_images() {
        let warehouse = Warehouse::new("test-project", "test-warehouse")
            .with_subscription(RepoSubscription::image("docker.io/library/nginx"))
            .with_subscription(RepoSubscription::git("https://github.com/example/repo"))
            .with_subscription(RepoSubscription::chart(
                "oci://registry.example.com/charts",
                Some("app".to_string()),
            ));

        assert!(warehouse.subscribes_to_image("docker.io/library/nginx"));
        // git and chart repositories are not image subscriptions
        assert!(!warehouse.subscribes_to_image("https://github.com/example/repo"));
        assert!(!warehouse.subscribes_to_image("oci://registry.example.com/charts"));
        assert!(!warehouse.subscribes_to_image("docker.io/library/nginx:latest"));
        assert_eq!(warehouse.image_subscriptions().count(), 1);
    }

    #[test]
    fn deserializes_without_subscriptions() {
        let warehouse: Warehouse =
            serde_json::from_str(r#"{"name": "w", "project": "p"}"#).unwrap();
        assert!(warehouse.subscriptions.is_empty());
        assert!(!warehouse.subscribes_to_image("anything"));
    }
}
