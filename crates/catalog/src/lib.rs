//! Snapshot discovery and access authorization for occex.
//!
//! Architecture role:
//! - [`snapshot`]: immutable snapshot descriptors and their signed form
//! - [`locator`]: remote search for snapshots intersecting a bounding box
//! - [`signer`]: exchange of a descriptor for a time-limited signed copy
//!
//! Search needs no authentication; data access does. Signing supersedes a
//! descriptor rather than mutating it, and the credential lifetime is never
//! visible to the caller — expiry only surfaces as a later fetch failure.

pub mod locator;
pub mod signer;
pub mod snapshot;

pub use locator::{CatalogLocator, StacCatalogClient};
pub use signer::{CredentialSigner, HttpCredentialSigner};
pub use snapshot::{SignedSnapshot, SnapshotAsset, SnapshotDescriptor};
