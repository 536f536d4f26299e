//! Partitioned snapshot tables over object storage.
//!
//! Architecture role:
//! - [`predicate`]: column projection and the row filter (taxon equality
//!   plus strict bounding-box ranges) applied to fetched fragments
//! - [`table`]: the [`PartitionedTable`] contract and its object-store
//!   backed implementation, plus the [`TableOpener`] re-authorization seam
//!
//! Nothing is materialized at open time beyond one object listing; each
//! partition is fetched, decoded, projected, and filtered on demand.

pub mod predicate;
pub mod table;

pub use predicate::{ColumnProjection, RowPredicate};
pub use table::{PartitionedTable, SnapshotTable, TableOpener};
