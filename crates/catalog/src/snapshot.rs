use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named byte-addressable asset attached to a snapshot.
///
/// `storage_options` carries dataset-specific access metadata (account
/// names, tokens) consumed verbatim when building the object store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotAsset {
    /// Object-store URI of the asset root.
    pub href: String,
    /// Backend options attached to the asset; signing merges credentials in.
    #[serde(default, alias = "table:storage_options")]
    pub storage_options: HashMap<String, String>,
}

/// A versioned, immutable publication of the source dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDescriptor {
    /// Snapshot identifier, unique within its collection.
    pub id: String,
    /// Publication time; newest-first ordering key.
    pub datetime: DateTime<Utc>,
    /// Named assets published with this snapshot.
    pub assets: HashMap<String, SnapshotAsset>,
}

impl SnapshotDescriptor {
    /// Looks up an asset by its catalog key.
    #[must_use]
    pub fn asset(&self, key: &str) -> Option<&SnapshotAsset> {
        self.assets.get(key)
    }
}

/// A snapshot descriptor whose assets carry time-limited access credentials.
///
/// Produced by [`crate::CredentialSigner::sign`]. The unsigned original is
/// superseded, never mutated: each authorization refresh yields a new
/// `SignedSnapshot`. No expiry value is available here; an expired
/// credential is only detectable through a subsequent fetch failure.
#[derive(Debug, Clone)]
pub struct SignedSnapshot {
    descriptor: SnapshotDescriptor,
}

impl SignedSnapshot {
    /// Wraps a descriptor whose assets already embed credentials.
    #[must_use]
    pub fn new(descriptor: SnapshotDescriptor) -> Self {
        Self { descriptor }
    }

    /// Identifier of the underlying snapshot version.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    /// The signed descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &SnapshotDescriptor {
        &self.descriptor
    }

    /// Looks up a signed asset by its catalog key.
    #[must_use]
    pub fn asset(&self, key: &str) -> Option<&SnapshotAsset> {
        self.descriptor.assets.get(key)
    }
}
