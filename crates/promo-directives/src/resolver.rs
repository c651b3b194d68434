//! Image update resolution
//!
//! Turns configured entries into the `key -> value` changes to write. An
//! image-backed entry is only satisfied by an origin whose Warehouse
//! subscribes to that image; Freight from any other origin is ignored even
//! if it carries a matching image. Resolution is all-or-nothing.

use crate::config::ImageUpdate;
use crate::context::{CancellationSignal, PromotionStepContext};
use crate::error::ResolveError;
use crate::origin::eligible_origins;
use promo_freight::{FreightCollection, FreightOrigin, Image, StoreError, Warehouse, WarehouseStore};
use promo_values::Changes;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Resolves image updates against Freight and Warehouse subscriptions
pub struct ImageUpdateResolver<'a> {
    store: &'a dyn WarehouseStore,
    project: &'a str,
    deadline: Option<Instant>,
    cancellation: Option<&'a CancellationSignal>,
}

impl std::fmt::Debug for ImageUpdateResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpdateResolver")
            .field("project", &self.project)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl<'a> ImageUpdateResolver<'a> {
    pub fn new(store: &'a dyn WarehouseStore, project: &'a str) -> Self {
        Self {
            store,
            project,
            deadline: None,
            cancellation: None,
        }
    }

    /// Resolver bound to the context's store, project, deadline and cancellation
    pub fn from_context(ctx: &'a PromotionStepContext) -> Self {
        let mut resolver = Self::new(ctx.store.as_ref(), &ctx.project);
        if let Some(deadline) = ctx.deadline {
            resolver = resolver.with_deadline(deadline);
        }
        if let Some(signal) = ctx.cancellation.as_ref() {
            resolver = resolver.with_cancellation(signal);
        }
        resolver
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, signal: &'a CancellationSignal) -> Self {
        self.cancellation = Some(signal);
        self
    }

    /// Resolve every update, in order
    ///
    /// # Errors
    /// - `ResolveError::Store` on the first failed Warehouse lookup; later
    ///   origins and entries are not tried
    /// - `ResolveError::NotFound` for the first image no eligible origin carries
    #[instrument(skip_all, fields(project = %self.project, updates = updates.len()))]
    pub async fn resolve(
        &self,
        updates: &[ImageUpdate],
        allowed: &[FreightOrigin],
        freight: &FreightCollection,
    ) -> Result<Changes, ResolveError> {
        let mut changes = Changes::new();
        for update in updates {
            match update {
                ImageUpdate::Literal { key, value } => {
                    debug!(key = %key, "Literal value");
                    changes.insert(key.clone(), value.clone());
                }
                ImageUpdate::Matched {
                    key,
                    image,
                    kind,
                    from_origin,
                } => {
                    let origins = eligible_origins(from_origin.as_ref(), allowed);
                    let found = self
                        .find_image(image, &origins, freight)
                        .await?
                        .ok_or_else(|| ResolveError::NotFound {
                            image: image.clone(),
                        })?;
                    let value = kind.format(found);
                    debug!(key = %key, image = %image, value = %value, "Resolved image");
                    changes.insert(key.clone(), value);
                }
            }
        }
        Ok(changes)
    }

    /// First image from the first origin that subscribes to `repo_url` and carries it
    async fn find_image<'f>(
        &self,
        repo_url: &str,
        origins: &[FreightOrigin],
        freight: &'f FreightCollection,
    ) -> Result<Option<&'f Image>, ResolveError> {
        for origin in origins {
            let Some(warehouse) = self.get_warehouse(origin).await? else {
                warn!(origin = %origin, project = %self.project, "Warehouse not found, skipping origin");
                continue;
            };
            if !warehouse.subscribes_to_image(repo_url) {
                warn!(origin = %origin, image = %repo_url, "Warehouse does not subscribe to image, skipping origin");
                continue;
            }
            if let Some(image) = freight.get(origin).and_then(|f| f.find_image(repo_url)) {
                return Ok(Some(image));
            }
        }
        Ok(None)
    }

    async fn get_warehouse(&self, origin: &FreightOrigin) -> Result<Option<Warehouse>, ResolveError> {
        let lookup = async {
            let pending = self.store.get_warehouse(self.project, &origin.name);
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, pending)
                    .await
                    .unwrap_or_else(|_| {
                        Err(StoreError::deadline_exceeded(self.project, &origin.name))
                    }),
                None => pending.await,
            }
        };

        let result = match self.cancellation {
            Some(signal) => tokio::select! {
                result = lookup => result,
                () = signal.cancelled() => Err(StoreError::Cancelled),
            },
            None => lookup.await,
        };
        result.map_err(|e| ResolveError::store(origin, e))
    }
}
