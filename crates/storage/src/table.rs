use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use object_store::path::Path as ObjectPath;
use object_store::{parse_url_opts, ObjectStore};
use occex_catalog::SignedSnapshot;
use occex_common::{OccexError, Result};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::{debug, info};
use url::Url;

use crate::predicate::{ColumnProjection, RowPredicate};

/// Logically partitioned table: a fixed partition count and a lazy
/// per-partition fetch-and-filter operation.
///
/// Repeated fetches for the same index re-fetch; there is no caching.
pub trait PartitionedTable: Send + Sync {
    /// Number of partitions, fixed at open time.
    fn partition_count(&self) -> usize;

    /// Materializes exactly one partition's projected and filtered rows.
    ///
    /// # Errors
    /// Returns [`OccexError::Fetch`] on credential expiry, transient
    /// network faults, or upstream unavailability.
    fn fetch_partition(&self, index: usize) -> Result<RecordBatch>;
}

/// Re-authorization seam: owns the locate → sign → open sequence
/// end-to-end, so a caller holding a stale handle can rebuild one with
/// fresh credentials without reaching into shared state.
pub trait TableOpener: Send + Sync {
    /// Opens a freshly located, signed, and listed table handle.
    ///
    /// # Errors
    /// Propagates locate/sign/open failures; none of these are the
    /// retryable fetch class.
    fn open_table(&self) -> Result<Box<dyn PartitionedTable>>;
}

/// Object-store backed snapshot table.
///
/// The partition map is the sorted `*.parquet` object listing under the
/// signed asset's prefix, taken once at open time. A handle opened from a
/// later-signed snapshot may list a different (rotated) snapshot version;
/// nothing here compares snapshot ids across handles.
#[derive(Debug)]
pub struct SnapshotTable {
    store: Arc<dyn ObjectStore>,
    partitions: Vec<ObjectPath>,
    snapshot_id: String,
    projection: ColumnProjection,
    predicate: RowPredicate,
}

impl SnapshotTable {
    /// Opens the named asset of a signed snapshot as a partitioned table.
    ///
    /// Performs one object listing; no partition data is read.
    ///
    /// # Errors
    /// Returns [`OccexError::InvalidConfig`] for a missing asset or
    /// unusable href, and [`OccexError::CatalogUnavailable`] if the
    /// partition listing itself fails.
    pub fn open(
        signed: &SignedSnapshot,
        asset_key: &str,
        projection: ColumnProjection,
        predicate: RowPredicate,
    ) -> Result<Self> {
        let asset = signed.asset(asset_key).ok_or_else(|| {
            OccexError::InvalidConfig(format!(
                "snapshot '{}' has no asset '{asset_key}'",
                signed.id()
            ))
        })?;

        let url = Url::parse(&asset.href).map_err(|e| {
            OccexError::InvalidConfig(format!("invalid asset href '{}': {e}", asset.href))
        })?;
        let (store, prefix) = parse_url_opts(&url, asset.storage_options.clone()).map_err(|e| {
            OccexError::InvalidConfig(format!(
                "failed to build object store for '{}': {e}",
                asset.href
            ))
        })?;
        let store: Arc<dyn ObjectStore> = Arc::from(store);

        let metas = futures::executor::block_on(
            store.list(Some(&prefix)).try_collect::<Vec<_>>(),
        )
        .map_err(|e| {
            OccexError::catalog(format!("partition listing failed for '{}': {e}", asset.href))
        })?;

        let mut partitions: Vec<ObjectPath> = metas
            .into_iter()
            .map(|m| m.location)
            .filter(|p| p.extension() == Some("parquet"))
            .collect();
        partitions.sort_unstable_by(|a, b| a.as_ref().cmp(b.as_ref()));

        if partitions.is_empty() {
            return Err(OccexError::InvalidConfig(format!(
                "asset '{asset_key}' of snapshot '{}' contains no parquet partitions",
                signed.id()
            )));
        }

        info!(
            snapshot = signed.id(),
            partitions = partitions.len(),
            "opened snapshot table"
        );
        Ok(Self {
            store,
            partitions,
            snapshot_id: signed.id().to_string(),
            projection,
            predicate,
        })
    }

    /// Identifier of the snapshot version this handle was opened from.
    #[must_use]
    pub fn snapshot_id(&self) -> &str {
        &self.snapshot_id
    }
}

impl PartitionedTable for SnapshotTable {
    fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    fn fetch_partition(&self, index: usize) -> Result<RecordBatch> {
        let path = self.partitions.get(index).ok_or_else(|| {
            OccexError::InvalidConfig(format!(
                "partition index {index} out of range for {} partitions",
                self.partitions.len()
            ))
        })?;

        let bytes = futures::executor::block_on(async {
            self.store.get(path).await?.bytes().await
        })
        .map_err(|e| OccexError::fetch(index, format!("object get failed for '{path}': {e}")))?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)
            .map_err(|e| OccexError::fetch(index, format!("parquet reader build failed: {e}")))?;
        let (fragment_schema, _) = self.projection.resolve(builder.schema().as_ref())?;
        let reader = builder
            .build()
            .map_err(|e| OccexError::fetch(index, format!("parquet reader open failed: {e}")))?;

        let mut filtered = Vec::new();
        for batch in reader {
            let batch = batch
                .map_err(|e| OccexError::fetch(index, format!("parquet decode failed: {e}")))?;
            let batch = self.projection.project(&batch)?;
            let batch = self.predicate.apply(&batch)?;
            if batch.num_rows() > 0 {
                filtered.push(batch);
            }
        }

        let fragment = concat_batches(&fragment_schema, filtered.iter())
            .map_err(|e| OccexError::fetch(index, format!("fragment concat failed: {e}")))?;
        debug!(
            snapshot = %self.snapshot_id,
            partition = index,
            rows = fragment.num_rows(),
            "fetched partition"
        );
        Ok(fragment)
    }
}
