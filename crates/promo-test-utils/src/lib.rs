//! Testing utilities for the promo workspace
//!
//! Shared fixtures and instrumented Warehouse stores.

#![allow(missing_docs)]

use async_trait::async_trait;
use promo_freight::{
    FreightCollection, FreightOrigin, FreightReference, Image, InMemoryWarehouseStore,
    RepoSubscription, StoreError, Warehouse, WarehouseStore,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const TEST_PROJECT: &str = "test-project";
pub const TEST_WAREHOUSE: &str = "test-warehouse";
pub const NGINX: &str = "docker.io/library/nginx";

/// Warehouse in [`TEST_PROJECT`] subscribing to the given image repositories
pub fn warehouse(name: &str, images: &[&str]) -> Warehouse {
    images.iter().fold(Warehouse::new(TEST_PROJECT, name), |w, repo| {
        w.with_subscription(RepoSubscription::image(*repo))
    })
}

/// `test-warehouse` subscribing to nginx
pub fn nginx_warehouse() -> Warehouse {
    warehouse(TEST_WAREHOUSE, &[NGINX])
}

/// Freight from one Warehouse carrying the given images
pub fn freight_with(warehouse: &str, images: Vec<Image>) -> FreightCollection {
    let reference = images
        .into_iter()
        .fold(FreightReference::new(FreightOrigin::warehouse(warehouse)), |r, image| {
            r.with_image(image)
        });
    FreightCollection::new().with(reference)
}

/// nginx:1.19.0 from `test-warehouse`, with digest `sha256:abcdef1234567890`
pub fn nginx_freight() -> FreightCollection {
    freight_with(
        TEST_WAREHOUSE,
        vec![Image::new(NGINX)
            .with_tag("1.19.0")
            .with_digest("sha256:abcdef1234567890")],
    )
}

pub fn store_with(warehouses: impl IntoIterator<Item = Warehouse>) -> InMemoryWarehouseStore {
    warehouses.into_iter().collect()
}

/// Write a file below `dir`, creating parent directories
pub fn write_file(dir: &Path, relative: &str, content: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

pub fn temp_dir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

/// Store that counts lookups
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: InMemoryWarehouseStore,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: InMemoryWarehouseStore) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WarehouseStore for CountingStore {
    async fn get_warehouse(
        &self,
        project: &str,
        name: &str,
    ) -> Result<Option<Warehouse>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_warehouse(project, name).await
    }
}

/// Store whose every lookup fails
#[derive(Debug, Clone)]
pub struct FailingStore {
    message: String,
}

impl FailingStore {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl WarehouseStore for FailingStore {
    async fn get_warehouse(&self, _: &str, _: &str) -> Result<Option<Warehouse>, StoreError> {
        Err(StoreError::Unavailable(self.message.clone()))
    }
}

/// Store that waits before answering
#[derive(Debug)]
pub struct SlowStore {
    inner: InMemoryWarehouseStore,
    delay: Duration,
}

impl SlowStore {
    pub fn new(inner: InMemoryWarehouseStore, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl WarehouseStore for SlowStore {
    async fn get_warehouse(
        &self,
        project: &str,
        name: &str,
    ) -> Result<Option<Warehouse>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_warehouse(project, name).await
    }
}
