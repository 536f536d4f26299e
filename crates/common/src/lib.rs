//! Shared configuration and error types for occex crates.
//!
//! Architecture role:
//! - defines the run configuration passed across layers (bounding box,
//!   sampling parameters, catalog endpoints, output path)
//! - provides common [`OccexError`] / [`Result`] contracts
//!
//! Key modules:
//! - [`config`]
//! - [`error`]

pub mod config;
pub mod error;

pub use config::{BoundingBox, ExtractConfig};
pub use error::{OccexError, Result};
