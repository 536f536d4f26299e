use std::collections::HashMap;
use std::time::Duration;

use occex_common::{OccexError, Result};
use serde::Deserialize;
use tracing::debug;

use crate::snapshot::{SignedSnapshot, SnapshotAsset, SnapshotDescriptor};

/// Exchange of a snapshot descriptor for a signed copy.
///
/// Deterministic given a valid external credential context. The signed
/// copy's access metadata is usable for a bounded, externally-determined
/// duration that is not exposed here: the system cannot renew proactively,
/// only retry reactively after a fetch failure.
pub trait CredentialSigner: Send + Sync {
    /// Produces a signed descriptor for `descriptor`'s assets.
    ///
    /// # Errors
    /// Returns [`OccexError::CatalogUnavailable`] if the signing service
    /// cannot be reached or rejects the descriptor.
    fn sign(&self, descriptor: &SnapshotDescriptor) -> Result<SignedSnapshot>;
}

/// Signing client over blocking HTTP.
///
/// Posts the descriptor to `{base}/sign`; the response carries the same
/// asset keys with credentials merged into each asset's storage options
/// (and possibly a re-written href).
pub struct HttpCredentialSigner {
    http: reqwest::blocking::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    assets: HashMap<String, SnapshotAsset>,
}

impl HttpCredentialSigner {
    /// Creates a signing client for `base_url` with the given call timeout.
    ///
    /// # Errors
    /// Returns [`OccexError::CatalogUnavailable`] if the HTTP client cannot
    /// be constructed.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OccexError::catalog(format!("failed to build http client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

impl CredentialSigner for HttpCredentialSigner {
    fn sign(&self, descriptor: &SnapshotDescriptor) -> Result<SignedSnapshot> {
        let url = format!("{}/sign", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(descriptor)
            .send()
            .map_err(|e| OccexError::catalog(format!("signing request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(OccexError::catalog(format!(
                "signing returned {status} for snapshot '{}': {body}",
                descriptor.id
            )));
        }

        let parsed: SignResponse = response
            .json()
            .map_err(|e| OccexError::catalog(format!("signing response decode failed: {e}")))?;

        // New signed copy; the unsigned descriptor is superseded, not mutated.
        let signed = SnapshotDescriptor {
            id: descriptor.id.clone(),
            datetime: descriptor.datetime,
            assets: parsed.assets,
        };
        debug!(snapshot = %signed.id, "descriptor signed");
        Ok(SignedSnapshot::new(signed))
    }
}
