//! Sampled occurrence extraction pipeline.
//!
//! Architecture role:
//! - [`extractor`]: the sampled partition extractor — seeded partition
//!   sampling, fragment accumulation, and the bounded re-authorization retry
//! - [`export`]: final column normalization and delimited-text export
//! - [`pipeline`]: the locate → sign → open → extract → export facade used
//!   by the `occex` binary
//!
//! Execution is strictly sequential and single-threaded; every remote call
//! blocks the caller, and the only shared state is the in-process fragment
//! accumulator owned by the extraction loop.

pub mod export;
pub mod extractor;
pub mod pipeline;

pub use export::ResultExporter;
pub use extractor::{Extraction, SampledExtractor};
pub use pipeline::{ExtractReport, Pipeline};
