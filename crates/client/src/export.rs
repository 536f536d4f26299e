use std::fs::File;
use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array};
use arrow::compute::concat_batches;
use arrow::csv::WriterBuilder;
use arrow::record_batch::RecordBatch;
use arrow_schema::{DataType, Field, Schema};
use occex_common::{OccexError, Result};
use tracing::info;

/// Occurrence-status flag written on every exported row: the record is a
/// presence, not an explicit absence.
pub const OCCURRENCE_STATUS_PRESENT: i64 = 1;

/// Final column normalization and delimited-text export.
///
/// Every step is a pure transformation with no filtering effect: by the
/// time fragments reach the exporter, each row already satisfies the
/// taxonomic and bounding-box predicates. The taxon column is dropped as
/// constant, the remaining columns are renamed to the external occurrence
/// schema, and a constant status flag is appended.
#[derive(Debug, Clone)]
pub struct ResultExporter {
    event_date_column: String,
    lat_column: String,
    lon_column: String,
}

impl ResultExporter {
    /// Builds an exporter that reads the given source column names.
    pub fn new(
        event_date_column: impl Into<String>,
        lat_column: impl Into<String>,
        lon_column: impl Into<String>,
    ) -> Self {
        Self {
            event_date_column: event_date_column.into(),
            lat_column: lat_column.into(),
            lon_column: lon_column.into(),
        }
    }

    /// Concatenates accumulated fragments once and normalizes them to the
    /// output schema `eventDate, decimalLatitude, decimalLongitude,
    /// occurrenceStatus`, row order preserved and re-indexed densely.
    ///
    /// An empty fragment list yields an empty batch with the same schema
    /// (the export still writes a header-only file).
    ///
    /// # Errors
    /// Returns [`OccexError::InvalidConfig`] for missing source columns and
    /// [`OccexError::Serialization`] if concatenation fails.
    pub fn finalize(&self, fragments: &[RecordBatch]) -> Result<RecordBatch> {
        if fragments.is_empty() {
            return Ok(RecordBatch::new_empty(Arc::new(Schema::new(vec![
                Field::new("eventDate", DataType::Utf8, true),
                Field::new("decimalLatitude", DataType::Float64, true),
                Field::new("decimalLongitude", DataType::Float64, true),
                Field::new("occurrenceStatus", DataType::Int64, false),
            ]))));
        }

        let schema = fragments[0].schema();
        let table = concat_batches(&schema, fragments.iter())
            .map_err(|e| OccexError::Serialization(format!("fragment concat failed: {e}")))?;

        let (event_date, event_date_field) = self.source_column(&table, &self.event_date_column)?;
        let (lat, lat_field) = self.source_column(&table, &self.lat_column)?;
        let (lon, lon_field) = self.source_column(&table, &self.lon_column)?;
        let status: ArrayRef = Arc::new(Int64Array::from(vec![
            OCCURRENCE_STATUS_PRESENT;
            table.num_rows()
        ]));

        let fields = vec![
            Field::new(
                "eventDate",
                event_date_field.data_type().clone(),
                event_date_field.is_nullable(),
            ),
            Field::new("decimalLatitude", DataType::Float64, lat_field.is_nullable()),
            Field::new("decimalLongitude", DataType::Float64, lon_field.is_nullable()),
            Field::new("occurrenceStatus", DataType::Int64, false),
        ];
        // The taxon column is intentionally not selected: filtering already
        // made it constant.
        RecordBatch::try_new(
            Arc::new(Schema::new(fields)),
            vec![event_date, lat, lon, status],
        )
        .map_err(|e| OccexError::Serialization(format!("output batch build failed: {e}")))
    }

    /// Serializes the finalized table to a delimited UTF-8 file with a
    /// header row and no index column. An existing file at `path` is
    /// overwritten; a rerun replaces the artifact wholesale.
    ///
    /// # Errors
    /// Returns [`OccexError::Io`] if the file cannot be created and
    /// [`OccexError::Serialization`] if the write fails.
    pub fn write_csv(&self, batch: &RecordBatch, path: &str) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = WriterBuilder::new().with_header(true).build(file);
        writer
            .write(batch)
            .map_err(|e| OccexError::Serialization(format!("csv write failed for '{path}': {e}")))?;
        info!(rows = batch.num_rows(), path, "export complete");
        Ok(())
    }

    fn source_column(&self, table: &RecordBatch, name: &str) -> Result<(ArrayRef, Field)> {
        let schema = table.schema();
        let idx = schema.index_of(name).map_err(|_| {
            OccexError::InvalidConfig(format!("export column '{name}' not found in fragments"))
        })?;
        Ok((table.column(idx).clone(), schema.field(idx).clone()))
    }
}
