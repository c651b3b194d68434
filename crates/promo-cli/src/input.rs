//! Loading step inputs from disk
//!
//! Files ending in `.yaml`/`.yml` are read as YAML, anything else as JSON.

use anyhow::{Context, Result};
use promo_freight::{FreightCollection, FreightRequest, InMemoryWarehouseStore, Warehouse};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;

/// Freight available to the promotion and the origins it may draw from
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FreightFile {
    #[serde(default)]
    pub(crate) freight: FreightCollection,
    #[serde(default)]
    pub(crate) freight_requests: Vec<FreightRequest>,
}

impl FreightFile {
    /// Requests, or every origin present in the Freight when none are listed
    pub(crate) fn requests(&self) -> Vec<FreightRequest> {
        if !self.freight_requests.is_empty() {
            return self.freight_requests.clone();
        }
        self.freight
            .references()
            .map(|r| FreightRequest::new(r.origin.clone()))
            .collect()
    }
}

pub(crate) fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    if is_yaml {
        serde_yaml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
    } else {
        serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
    }
}

pub(crate) fn load_warehouses(path: Option<&Path>) -> Result<InMemoryWarehouseStore> {
    let Some(path) = path else {
        return Ok(InMemoryWarehouseStore::new());
    };
    let warehouses: Vec<Warehouse> = load(path)?;
    Ok(warehouses.into_iter().collect())
}
