//! Helm values file edits
//!
//! Dot-path updates of string scalars in YAML values files, applied in
//! place so that comments, key order and quoting survive.
//!
//! # Example
//!
//! ```rust
//! use promo_values::{apply_changes, Changes};
//!
//! let mut changes = Changes::new();
//! changes.insert("image.tag".to_string(), "1.19.0".to_string());
//!
//! let out = apply_changes("image:\n  tag: oldtag # pinned\n", &changes).unwrap();
//! assert_eq!(out, "image:\n  tag: 1.19.0 # pinned\n");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod document;
mod error;
mod patch;
mod path;

pub use document::ValuesDocument;
pub use error::PatchError;
pub use patch::{apply_changes, secure_join, update_values_file, Changes};
pub use path::{PathError, ValuePath};
