#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use arrow::array::{Float64Array, StringArray};
use arrow::record_batch::RecordBatch;
use arrow_schema::{DataType, Field, Schema};
use occex_catalog::{
    CatalogLocator, CredentialSigner, SignedSnapshot, SnapshotAsset, SnapshotDescriptor,
};
use occex_common::{BoundingBox, OccexError, Result};
use occex_storage::{PartitionedTable, TableOpener};

pub fn unique_path(ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("occex_client_{nanos}.{ext}"))
}

pub fn unique_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("occex_client_{tag}_{nanos}"));
    std::fs::create_dir_all(&dir).expect("create fixture dir");
    dir
}

pub fn richmond_bbox() -> BoundingBox {
    BoundingBox::new(150.62, -33.69, 150.83, -33.48).expect("valid bbox")
}

pub fn occurrence_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("eventdate", DataType::Utf8, true),
        Field::new("order", DataType::Utf8, true),
        Field::new("decimallatitude", DataType::Float64, true),
        Field::new("decimallongitude", DataType::Float64, true),
    ]))
}

/// Builds a fragment batch in the projected snapshot schema.
pub fn occurrence_batch(rows: &[(&str, &str, f64, f64)]) -> RecordBatch {
    RecordBatch::try_new(
        occurrence_schema(),
        vec![
            Arc::new(StringArray::from(
                rows.iter().map(|r| Some(r.0)).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from(
                rows.iter().map(|r| Some(r.1)).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| Some(r.2)).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| Some(r.3)).collect::<Vec<_>>(),
            )),
        ],
    )
    .expect("build batch")
}

/// In-memory partitioned table with per-index failure injection.
pub struct MockTable {
    partitions: Vec<RecordBatch>,
    failing: HashSet<usize>,
    misconfigured: HashSet<usize>,
}

impl MockTable {
    pub fn new(partitions: Vec<RecordBatch>) -> Self {
        Self {
            partitions,
            failing: HashSet::new(),
            misconfigured: HashSet::new(),
        }
    }

    /// Marks indices whose fetch raises the retryable fetch error.
    pub fn failing_on(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.failing = indices.into_iter().collect();
        self
    }

    /// Marks indices whose fetch raises a non-retryable config error.
    pub fn misconfigured_on(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.misconfigured = indices.into_iter().collect();
        self
    }
}

impl PartitionedTable for MockTable {
    fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    fn fetch_partition(&self, index: usize) -> Result<RecordBatch> {
        if self.failing.contains(&index) {
            return Err(OccexError::fetch(index, "simulated credential expiry"));
        }
        if self.misconfigured.contains(&index) {
            return Err(OccexError::InvalidConfig(format!(
                "simulated schema mismatch in partition {index}"
            )));
        }
        self.partitions
            .get(index)
            .cloned()
            .ok_or_else(|| {
                OccexError::InvalidConfig(format!(
                    "partition index {index} out of range for {} partitions",
                    self.partitions.len()
                ))
            })
    }
}

/// Opener that hands out a scripted sequence of tables, one per
/// authorization cycle, and counts how many cycles ran.
pub struct ScriptedOpener {
    tables: Mutex<VecDeque<MockTable>>,
    opens: AtomicUsize,
}

impl ScriptedOpener {
    pub fn new(tables: Vec<MockTable>) -> Self {
        Self {
            tables: Mutex::new(tables.into()),
            opens: AtomicUsize::new(0),
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl TableOpener for ScriptedOpener {
    fn open_table(&self) -> Result<Box<dyn PartitionedTable>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let table = self
            .tables
            .lock()
            .expect("opener lock poisoned")
            .pop_front()
            .ok_or_else(|| OccexError::catalog("no more scripted tables"))?;
        Ok(Box::new(table))
    }
}

/// Locator answering from a fixed snapshot list and counting calls.
pub struct FixedLocator {
    snapshots: Vec<SnapshotDescriptor>,
    calls: AtomicUsize,
}

impl FixedLocator {
    pub fn new(snapshots: Vec<SnapshotDescriptor>) -> Self {
        Self {
            snapshots,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CatalogLocator for FixedLocator {
    fn locate(&self, _bbox: &BoundingBox, _collection: &str) -> Result<Vec<SnapshotDescriptor>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshots.clone())
    }
}

/// Signer that passes descriptors through unchanged and counts calls.
pub struct PassthroughSigner {
    calls: AtomicUsize,
}

impl PassthroughSigner {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CredentialSigner for PassthroughSigner {
    fn sign(&self, descriptor: &SnapshotDescriptor) -> Result<SignedSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SignedSnapshot::new(descriptor.clone()))
    }
}

/// Snapshot descriptor whose single `data` asset points at a local
/// directory of parquet partitions.
pub fn local_snapshot(id: &str, datetime: &str, dir: &std::path::Path) -> SnapshotDescriptor {
    SnapshotDescriptor {
        id: id.to_string(),
        datetime: datetime.parse().expect("timestamp"),
        assets: HashMap::from([(
            "data".to_string(),
            SnapshotAsset {
                href: format!("file://{}", dir.display()),
                storage_options: HashMap::new(),
            },
        )]),
    }
}
