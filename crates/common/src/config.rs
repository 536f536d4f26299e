use std::env;
use std::fs;

use serde::{Deserialize, Serialize};

use crate::error::{OccexError, Result};

/// Geographic bounding box in decimal degrees.
///
/// Containment is strict on every edge: a point exactly on a bound is
/// outside. Set once at configuration time and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Builds a validated bounding box.
    ///
    /// # Errors
    /// Returns [`OccexError::InvalidConfig`] if `min >= max` on either axis.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self> {
        let bbox = Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Checks the `min < max` invariant on both axes.
    ///
    /// # Errors
    /// Returns [`OccexError::InvalidConfig`] describing the violated axis.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_lon < self.max_lon) {
            return Err(OccexError::InvalidConfig(format!(
                "bounding box requires min_lon < max_lon, got {} >= {}",
                self.min_lon, self.max_lon
            )));
        }
        if !(self.min_lat < self.max_lat) {
            return Err(OccexError::InvalidConfig(format!(
                "bounding box requires min_lat < max_lat, got {} >= {}",
                self.min_lat, self.max_lat
            )));
        }
        Ok(())
    }

    /// Strict containment check (points on an edge are outside).
    #[must_use]
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon > self.min_lon && lon < self.max_lon && lat > self.min_lat && lat < self.max_lat
    }

    /// `[min_lon, min_lat, max_lon, max_lat]`, the wire order catalog
    /// search endpoints expect.
    #[must_use]
    pub fn as_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }
}

/// One extraction run's configuration.
///
/// Defaults describe the Richmond (NSW) frog survey: GBIF occurrence
/// snapshots filtered to the order Anura inside the Richmond bounding box,
/// with a 10% partition sample under a fixed seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Base URL of the snapshot search API.
    pub catalog_url: String,
    /// Base URL of the credential signing API.
    pub signing_url: String,
    /// Collection identifier to search for.
    pub collection: String,
    /// Name of the snapshot asset holding the partitioned table.
    pub asset_key: String,
    /// Geographic extent rows must fall strictly inside.
    pub bbox: BoundingBox,
    /// Taxonomic order rows must match exactly.
    pub taxon_order: String,
    /// Per-partition inclusion probability, in `(0, 1]`.
    pub sample_probability: f64,
    /// Seed for the sampling source; fixes the sampled index set for a
    /// fixed partition count.
    pub sample_seed: u64,
    /// Destination path for the delimited output; overwritten on rerun.
    pub output_path: String,
    /// HTTP timeout for catalog and signing calls, in seconds.
    pub http_timeout_secs: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            catalog_url: "https://planetarycomputer.microsoft.com/api/stac/v1".to_string(),
            signing_url: "https://planetarycomputer.microsoft.com/api/sas/v1".to_string(),
            collection: "gbif".to_string(),
            asset_key: "data".to_string(),
            bbox: BoundingBox {
                min_lon: 150.62,
                min_lat: -33.69,
                max_lon: 150.83,
                max_lat: -33.48,
            },
            taxon_order: "Anura".to_string(),
            sample_probability: 0.1,
            sample_seed: 420,
            output_path: "richmond_frogs.csv".to_string(),
            http_timeout_secs: 30,
        }
    }
}

impl ExtractConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    /// Returns [`OccexError::Io`] if the file cannot be read and
    /// [`OccexError::InvalidConfig`] if it does not parse.
    pub fn load_from_json(path: &str) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let config: Self =
            serde_json::from_str(&s).map_err(|e| OccexError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `OCCEX_*` environment overrides on top of this configuration.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("OCCEX_CATALOG_URL") {
            self.catalog_url = v;
        }
        if let Ok(v) = env::var("OCCEX_SIGNING_URL") {
            self.signing_url = v;
        }
        if let Ok(v) = env::var("OCCEX_COLLECTION") {
            self.collection = v;
        }
        if let Ok(v) = env::var("OCCEX_OUTPUT_PATH") {
            self.output_path = v;
        }
        if let Some(v) = env::var("OCCEX_SAMPLE_PROBABILITY")
            .ok()
            .and_then(|x| x.parse::<f64>().ok())
        {
            self.sample_probability = v;
        }
        if let Some(v) = env::var("OCCEX_SAMPLE_SEED")
            .ok()
            .and_then(|x| x.parse::<u64>().ok())
        {
            self.sample_seed = v;
        }
        if let Some(v) = env::var("OCCEX_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|x| x.parse::<u64>().ok())
        {
            self.http_timeout_secs = v.max(1);
        }
        self
    }

    /// Checks the whole-run configuration contract.
    ///
    /// # Errors
    /// Returns [`OccexError::InvalidConfig`] on the first violated field.
    pub fn validate(&self) -> Result<()> {
        self.bbox.validate()?;
        if !(self.sample_probability > 0.0 && self.sample_probability <= 1.0) {
            return Err(OccexError::InvalidConfig(format!(
                "sample probability must be in (0, 1], got {}",
                self.sample_probability
            )));
        }
        if self.collection.is_empty() {
            return Err(OccexError::InvalidConfig(
                "collection identifier must not be empty".to_string(),
            ));
        }
        if self.asset_key.is_empty() {
            return Err(OccexError::InvalidConfig(
                "asset key must not be empty".to_string(),
            ));
        }
        if self.taxon_order.is_empty() {
            return Err(OccexError::InvalidConfig(
                "taxonomic order filter must not be empty".to_string(),
            ));
        }
        if self.output_path.is_empty() {
            return Err(OccexError::InvalidConfig(
                "output path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
