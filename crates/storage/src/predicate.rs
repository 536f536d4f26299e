use std::sync::Arc;

use arrow::array::{Float64Array, Scalar, StringArray};
use arrow::compute::kernels::cmp::{eq, gt, lt};
use arrow::compute::{and, filter_record_batch};
use arrow::record_batch::RecordBatch;
use arrow_schema::{Schema, SchemaRef};
use occex_common::{BoundingBox, OccexError, Result};

/// Ordered set of columns read from each partition.
#[derive(Debug, Clone)]
pub struct ColumnProjection {
    columns: Vec<String>,
}

impl ColumnProjection {
    /// Builds a projection over the given column names, in order.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Projected column names in output order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Resolves this projection against a source schema.
    ///
    /// # Errors
    /// Returns [`OccexError::InvalidConfig`] for a column the source schema
    /// does not carry.
    pub fn resolve(&self, source: &Schema) -> Result<(SchemaRef, Vec<usize>)> {
        let mut fields = Vec::with_capacity(self.columns.len());
        let mut indices = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let idx = source.index_of(column).map_err(|_| {
                OccexError::InvalidConfig(format!(
                    "projection column '{column}' not found in snapshot schema"
                ))
            })?;
            indices.push(idx);
            fields.push(source.field(idx).clone());
        }
        Ok((Arc::new(Schema::new(fields)), indices))
    }

    /// Restricts a batch to the projected columns.
    ///
    /// # Errors
    /// Returns [`OccexError::InvalidConfig`] if a projected column is
    /// missing from the batch.
    pub fn project(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let (_, indices) = self.resolve(batch.schema().as_ref())?;
        batch
            .project(&indices)
            .map_err(|e| OccexError::InvalidConfig(format!("projection failed: {e}")))
    }
}

/// Row filter pushed down to the partition fetch: equality on the
/// taxonomic order plus strict bounding-box ranges on latitude/longitude.
///
/// Evaluated lazily against each fetched fragment, never at open time.
/// Rows with a null taxon or coordinate never match.
#[derive(Debug, Clone)]
pub struct RowPredicate {
    pub taxon_column: String,
    pub taxon_value: String,
    pub lat_column: String,
    pub lon_column: String,
    pub bbox: BoundingBox,
}

impl RowPredicate {
    /// Returns the rows of `batch` satisfying the predicate.
    ///
    /// # Errors
    /// Returns [`OccexError::InvalidConfig`] if a predicate column is
    /// missing or has the wrong type.
    pub fn apply(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let taxon = self.utf8_column(batch, &self.taxon_column)?;
        let lat = self.float_column(batch, &self.lat_column)?;
        let lon = self.float_column(batch, &self.lon_column)?;

        let taxon_eq = eq(
            taxon,
            &Scalar::new(StringArray::from(vec![self.taxon_value.as_str()])),
        )
        .map_err(|e| OccexError::InvalidConfig(format!("predicate evaluation failed: {e}")))?;

        let lat_lo = gt(lat, &Scalar::new(Float64Array::from(vec![self.bbox.min_lat])));
        let lat_hi = lt(lat, &Scalar::new(Float64Array::from(vec![self.bbox.max_lat])));
        let lon_lo = gt(lon, &Scalar::new(Float64Array::from(vec![self.bbox.min_lon])));
        let lon_hi = lt(lon, &Scalar::new(Float64Array::from(vec![self.bbox.max_lon])));

        let mut mask = taxon_eq;
        for bound in [lat_lo, lat_hi, lon_lo, lon_hi] {
            let bound = bound.map_err(|e| {
                OccexError::InvalidConfig(format!("predicate evaluation failed: {e}"))
            })?;
            mask = and(&mask, &bound).map_err(|e| {
                OccexError::InvalidConfig(format!("predicate evaluation failed: {e}"))
            })?;
        }

        filter_record_batch(batch, &mask)
            .map_err(|e| OccexError::InvalidConfig(format!("predicate filter failed: {e}")))
    }

    fn utf8_column<'a>(&self, batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
        let idx = batch.schema().index_of(name).map_err(|_| {
            OccexError::InvalidConfig(format!(
                "predicate column '{name}' not found in snapshot schema"
            ))
        })?;
        batch
            .column(idx)
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| {
                OccexError::InvalidConfig(format!("predicate column '{name}' is not utf8"))
            })
    }

    fn float_column<'a>(&self, batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
        let idx = batch.schema().index_of(name).map_err(|_| {
            OccexError::InvalidConfig(format!(
                "predicate column '{name}' not found in snapshot schema"
            ))
        })?;
        batch
            .column(idx)
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| {
                OccexError::InvalidConfig(format!("predicate column '{name}' is not float64"))
            })
    }
}
