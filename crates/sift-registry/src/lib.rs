//! Repository metadata for the sift package query engine.
//!
//! Each configured repository points at a JSON file holding an array of
//! package records. This crate deserializes those records leniently into
//! [`RemotePackage`] values; building the in-memory pool is left to
//! `sift-core`.
//!
//! # Example
//!
//! ```no_run
//! use sift_config::config::get_config;
//! use sift_registry::load_repositories;
//!
//! fn count() -> sift_registry::Result<usize> {
//!     let repos = load_repositories(&get_config())?;
//!     Ok(repos.iter().map(|(_, pkgs)| pkgs.len()).sum())
//! }
//! ```

pub mod error;
pub mod metadata;
pub mod package;

pub use error::{ErrorContext, RegistryError, Result};
pub use metadata::{load_metadata, load_repositories, parse_metadata};
pub use package::RemotePackage;
