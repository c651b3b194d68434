//! Freight and provenance
//!
//! Immutable artifact records ("Freight") and the Warehouses that produce them.
//!
//! # Core Concepts
//!
//! - [`FreightOrigin`]: identifies a provenance source, keyed as `kind/name`
//! - [`FreightReference`]: the images a single origin contributed to a promotion
//! - [`FreightCollection`]: every [`FreightReference`] available to a promotion, by origin key
//! - [`Warehouse`]: a provenance object declaring the repositories it subscribes to
//! - [`WarehouseStore`]: the lookup seam used to fetch Warehouses by project and name
//!
//! # Example
//!
//! ```rust
//! use promo_freight::{FreightCollection, FreightOrigin, FreightReference, Image};
//!
//! let origin = FreightOrigin::warehouse("test-warehouse");
//! let mut collection = FreightCollection::new();
//! collection.insert(
//!     FreightReference::new(origin.clone())
//!         .with_image(Image::new("docker.io/library/nginx").with_tag("1.19.0")),
//! );
//!
//! let image = collection
//!     .get(&origin)
//!     .and_then(|f| f.find_image("docker.io/library/nginx"))
//!     .unwrap();
//! assert_eq!(image.tag, "1.19.0");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod freight;
mod store;
mod warehouse;

pub use error::StoreError;
pub use freight::{
    FreightCollection, FreightOrigin, FreightReference, FreightRequest, Image, WAREHOUSE_KIND,
};
pub use store::{InMemoryWarehouseStore, WarehouseStore};
pub use warehouse::{
    ChartSubscription, GitSubscription, ImageSubscription, RepoSubscription, Warehouse,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
