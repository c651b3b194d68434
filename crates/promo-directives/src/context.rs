//! Step invocation context
//!
//! Everything a step needs from its caller: project, work dir, Freight,
//! the Warehouse store handle, and the caller's deadline and cancellation.

use promo_freight::{FreightCollection, FreightOrigin, FreightRequest, WarehouseStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Context for one step invocation
#[derive(Clone)]
pub struct PromotionStepContext {
    pub project: String,
    /// Exclusive working directory; step paths are relative to it
    pub work_dir: PathBuf,
    pub freight: FreightCollection,
    /// Origins this promotion may draw Freight from, in order
    pub freight_requests: Vec<FreightRequest>,
    pub store: Arc<dyn WarehouseStore>,
    pub deadline: Option<Instant>,
    pub cancellation: Option<CancellationSignal>,
}

impl std::fmt::Debug for PromotionStepContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromotionStepContext")
            .field("project", &self.project)
            .field("work_dir", &self.work_dir)
            .field("freight", &self.freight.len())
            .field("freight_requests", &self.freight_requests.len())
            .field("deadline", &self.deadline)
            .field("cancellable", &self.cancellation.is_some())
            .finish_non_exhaustive()
    }
}

impl PromotionStepContext {
    /// Create context with no Freight, no deadline and no cancellation
    pub fn new(
        project: impl Into<String>,
        work_dir: impl Into<PathBuf>,
        store: Arc<dyn WarehouseStore>,
    ) -> Self {
        Self {
            project: project.into(),
            work_dir: work_dir.into(),
            freight: FreightCollection::new(),
            freight_requests: Vec::new(),
            store,
            deadline: None,
            cancellation: None,
        }
    }

    #[must_use]
    pub fn with_freight(mut self, freight: FreightCollection) -> Self {
        self.freight = freight;
        self
    }

    #[must_use]
    pub fn with_freight_requests(mut self, requests: Vec<FreightRequest>) -> Self {
        self.freight_requests = requests;
        self
    }

    /// Request Freight from a single origin, appended to the list
    #[must_use]
    pub fn with_freight_request(mut self, origin: FreightOrigin) -> Self {
        self.freight_requests.push(FreightRequest::new(origin));
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    #[must_use]
    pub fn with_cancellation(mut self, signal: CancellationSignal) -> Self {
        self.cancellation = Some(signal);
        self
    }

    /// Origins of the freight requests, in request order
    #[must_use]
    pub fn allowed_origins(&self) -> Vec<FreightOrigin> {
        self.freight_requests
            .iter()
            .map(|r| r.origin.clone())
            .collect()
    }
}

/// Create a linked cancellation handle and signal
#[must_use]
pub fn cancellation() -> (CancellationHandle, CancellationSignal) {
    let (tx, rx) = watch::channel(false);
    (
        CancellationHandle { tx: Arc::new(tx) },
        CancellationSignal { rx },
    )
}

/// Caller side: cancels every linked signal
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancellationHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Step side: observed around store lookups
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    rx: watch::Receiver<bool>,
}

impl CancellationSignal {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled; never resolves if the handle is dropped first
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}
