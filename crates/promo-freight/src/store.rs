//! Warehouse store
//!
//! The object-store seam. Steps receive a store handle instead of reaching
//! for a global client, so resolution can run against an in-memory store.

use crate::error::StoreError;
use crate::warehouse::Warehouse;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Lookup of Warehouses by project and name
#[async_trait]
pub trait WarehouseStore: Send + Sync {
    /// Fetch a Warehouse
    ///
    /// # Returns
    /// - `Ok(Some(_))` if the Warehouse exists
    /// - `Ok(None)` if it does not
    ///
    /// # Errors
    /// Transport or backend failures.
    async fn get_warehouse(&self, project: &str, name: &str)
        -> Result<Option<Warehouse>, StoreError>;
}

#[async_trait]
impl<T: WarehouseStore + ?Sized> WarehouseStore for Arc<T> {
    async fn get_warehouse(
        &self,
        project: &str,
        name: &str,
    ) -> Result<Option<Warehouse>, StoreError> {
        (**self).get_warehouse(project, name).await
    }
}

/// Store backed by a map, keyed by `(project, name)`
#[derive(Debug, Clone, Default)]
pub struct InMemoryWarehouseStore {
    warehouses: HashMap<(String, String), Warehouse>,
}

impl InMemoryWarehouseStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a Warehouse, replacing one with the same project and name
    pub fn insert(&mut self, warehouse: Warehouse) -> Option<Warehouse> {
        self.warehouses
            .insert((warehouse.project.clone(), warehouse.name.clone()), warehouse)
    }

    /// Builder-style insert
    #[inline]
    #[must_use]
    pub fn with_warehouse(mut self, warehouse: Warehouse) -> Self {
        self.insert(warehouse);
        self
    }

    /// Number of stored Warehouses
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.warehouses.len()
    }

    /// Check if store is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.warehouses.is_empty()
    }
}

impl FromIterator<Warehouse> for InMemoryWarehouseStore {
    fn from_iter<I: IntoIterator<Item = Warehouse>>(iter: I) -> Self {
        let mut store = Self::new();
        for warehouse in iter {
            store.insert(warehouse);
        }
        store
    }
}

#[async_trait]
impl WarehouseStore for InMemoryWarehouseStore {
    async fn get_warehouse(
        &self,
        project: &str,
        name: &str,
    ) -> Result<Option<Warehouse>, StoreError> {
        Ok(self
            .warehouses
            .get(&(project.to_string(), name.to_string()))
            .cloned())
    }
}
