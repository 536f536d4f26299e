use std::sync::Arc;

use occex_catalog::{CatalogLocator, CredentialSigner};
use occex_common::{ExtractConfig, OccexError, Result};
use occex_storage::{ColumnProjection, PartitionedTable, RowPredicate, SnapshotTable, TableOpener};
use tracing::info;

use crate::export::ResultExporter;
use crate::extractor::SampledExtractor;

/// Column names carried by the upstream occurrence snapshots.
pub const EVENT_DATE_COLUMN: &str = "eventdate";
pub const TAXON_ORDER_COLUMN: &str = "order";
pub const LATITUDE_COLUMN: &str = "decimallatitude";
pub const LONGITUDE_COLUMN: &str = "decimallongitude";

/// Summary of one completed extraction run.
#[derive(Debug, Clone)]
pub struct ExtractReport {
    /// Partition count of the table when first opened.
    pub partitions_total: usize,
    /// Partitions actually sampled and fetched.
    pub partitions_sampled: usize,
    /// Rows in the exported file.
    pub rows_written: usize,
    /// Where the delimited output landed.
    pub output_path: String,
}

/// Sequential extract–filter–save pipeline.
///
/// Data flow: locator → signer → partitioned table → sampled extractor →
/// exporter. The locator's result is threaded through explicitly — there is
/// no process-wide snapshot state — which is what lets the extractor rebuild
/// the whole chain through [`TableOpener`] when credentials expire mid-run.
pub struct Pipeline {
    config: ExtractConfig,
    locator: Arc<dyn CatalogLocator>,
    signer: Arc<dyn CredentialSigner>,
}

impl Pipeline {
    /// Wires a pipeline from a validated configuration and its two remote
    /// collaborators.
    ///
    /// # Errors
    /// Returns [`OccexError::InvalidConfig`] if the configuration fails
    /// validation.
    pub fn new(
        config: ExtractConfig,
        locator: Arc<dyn CatalogLocator>,
        signer: Arc<dyn CredentialSigner>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            locator,
            signer,
        })
    }

    /// Runs the whole pipeline once and writes the output file.
    ///
    /// A fatal error anywhere discards the in-memory accumulator; nothing
    /// is written on failure and there is no partial-output checkpoint.
    ///
    /// # Errors
    /// Propagates catalog, fetch (after its one retry), and export errors.
    pub fn run(&self) -> Result<ExtractReport> {
        let extractor =
            SampledExtractor::new(self.config.sample_probability, self.config.sample_seed)?;
        let extraction = extractor.run(self)?;

        let exporter = ResultExporter::new(EVENT_DATE_COLUMN, LATITUDE_COLUMN, LONGITUDE_COLUMN);
        let output = exporter.finalize(&extraction.fragments)?;
        exporter.write_csv(&output, &self.config.output_path)?;

        let report = ExtractReport {
            partitions_total: extraction.partitions_total,
            partitions_sampled: extraction.fragments.len(),
            rows_written: output.num_rows(),
            output_path: self.config.output_path.clone(),
        };
        info!(
            partitions_total = report.partitions_total,
            partitions_sampled = report.partitions_sampled,
            rows_written = report.rows_written,
            "extraction run complete"
        );
        Ok(report)
    }

    fn projection(&self) -> ColumnProjection {
        ColumnProjection::new([
            EVENT_DATE_COLUMN,
            TAXON_ORDER_COLUMN,
            LATITUDE_COLUMN,
            LONGITUDE_COLUMN,
        ])
    }

    fn predicate(&self) -> RowPredicate {
        RowPredicate {
            taxon_column: TAXON_ORDER_COLUMN.to_string(),
            taxon_value: self.config.taxon_order.clone(),
            lat_column: LATITUDE_COLUMN.to_string(),
            lon_column: LONGITUDE_COLUMN.to_string(),
            bbox: self.config.bbox,
        }
    }
}

impl TableOpener for Pipeline {
    /// One end-to-end authorization cycle: search, take the newest
    /// snapshot, sign it, open its data asset.
    fn open_table(&self) -> Result<Box<dyn PartitionedTable>> {
        let snapshots = self
            .locator
            .locate(&self.config.bbox, &self.config.collection)?;
        let newest = snapshots.into_iter().next().ok_or_else(|| {
            OccexError::InvalidConfig(format!(
                "no snapshot published for collection '{}'",
                self.config.collection
            ))
        })?;
        let signed = self.signer.sign(&newest)?;
        let table = SnapshotTable::open(
            &signed,
            &self.config.asset_key,
            self.projection(),
            self.predicate(),
        )?;
        Ok(Box::new(table))
    }
}
