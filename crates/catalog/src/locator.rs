use std::time::Duration;

use chrono::{DateTime, Utc};
use occex_common::{BoundingBox, OccexError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::snapshot::{SnapshotAsset, SnapshotDescriptor};

/// Remote snapshot search.
///
/// Only collection and bounding-box filtering happen server-side; row-level
/// taxonomic filtering belongs to the partition fetch path.
pub trait CatalogLocator: Send + Sync {
    /// Returns snapshots of `collection` intersecting `bbox`, newest first.
    ///
    /// An empty list is a valid answer (the catalog responded but has
    /// nothing matching).
    ///
    /// # Errors
    /// Returns [`OccexError::CatalogUnavailable`] if the search cannot be
    /// completed; the caller has no local fallback.
    fn locate(&self, bbox: &BoundingBox, collection: &str) -> Result<Vec<SnapshotDescriptor>>;
}

/// STAC-style search client over blocking HTTP.
pub struct StacCatalogClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    collections: [&'a str; 1],
    bbox: [f64; 4],
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    features: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: String,
    properties: ItemProperties,
    #[serde(default)]
    assets: std::collections::HashMap<String, SnapshotAsset>,
}

#[derive(Debug, Deserialize)]
struct ItemProperties {
    datetime: DateTime<Utc>,
}

/// Flattens search items into descriptors ordered newest first.
///
/// The catalog already sorts reverse-chronologically; the sort here makes
/// the ordering a local guarantee instead of a remote one.
fn items_to_descriptors(items: Vec<SearchItem>) -> Vec<SnapshotDescriptor> {
    let mut descriptors: Vec<SnapshotDescriptor> = items
        .into_iter()
        .map(|item| SnapshotDescriptor {
            id: item.id,
            datetime: item.properties.datetime,
            assets: item.assets,
        })
        .collect();
    descriptors.sort_by(|a, b| b.datetime.cmp(&a.datetime));
    descriptors
}

impl StacCatalogClient {
    /// Creates a search client for `base_url` with the given call timeout.
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

impl CatalogLocator for StacCatalogClient {
    fn locate(&self, bbox: &BoundingBox, collection: &str) -> Result<Vec<SnapshotDescriptor>> {
        let url = format!("{}/search", self.base_url);
        let request = SearchRequest {
            collections: [collection],
            bbox: bbox.as_array(),
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| OccexError::catalog(format!("search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(OccexError::catalog(format!(
                "search returned {status} for collection '{collection}': {body}"
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .map_err(|e| OccexError::catalog(format!("search response decode failed: {e}")))?;
        let descriptors = items_to_descriptors(parsed.features);
        debug!(
            collection,
            snapshots = descriptors.len(),
            "catalog search completed"
        );
        Ok(descriptors)
    }
}
