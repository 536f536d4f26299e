use arrow::record_batch::RecordBatch;
use occex_common::{OccexError, Result};
use occex_storage::TableOpener;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

/// Everything one extraction run accumulated.
#[derive(Debug)]
pub struct Extraction {
    /// Filtered fragments of the sampled partitions, in visit order.
    /// Concatenated once at export time.
    pub fragments: Vec<RecordBatch>,
    /// Partition count observed when the table was first opened.
    pub partitions_total: usize,
}

/// Partition-level sampling extractor.
///
/// Visits every partition index in order and includes each independently
/// with a fixed probability drawn from a seeded source, so a fixed seed and
/// a fixed partition count select the same sample in the same order on
/// every run. Sampling happens at partition granularity because fetch cost
/// is dominated by per-partition IO; a 10% sample costs roughly 10% of an
/// exhaustive scan.
#[derive(Debug, Clone)]
pub struct SampledExtractor {
    probability: f64,
    seed: u64,
}

impl SampledExtractor {
    /// Builds an extractor with the given inclusion probability and seed.
    ///
    /// # Errors
    /// Returns [`OccexError::InvalidConfig`] unless `0 < probability <= 1`.
    pub fn new(probability: f64, seed: u64) -> Result<Self> {
        if !(probability > 0.0 && probability <= 1.0) {
            return Err(OccexError::InvalidConfig(format!(
                "sample probability must be in (0, 1], got {probability}"
            )));
        }
        Ok(Self { probability, seed })
    }

    /// The index set this extractor samples out of `partition_count`
    /// partitions. Drawn from the same seeded sequence as [`Self::run`].
    #[must_use]
    pub fn sampled_indices(&self, partition_count: usize) -> Vec<usize> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..partition_count)
            .filter(|_| rng.gen::<f64>() < self.probability)
            .collect()
    }

    /// Runs one extraction: open, sample, fetch, accumulate.
    ///
    /// A failed fetch is retried exactly once, after `opener` rebuilds the
    /// handle with freshly signed credentials end-to-end. The retried fetch
    /// is not caught again: a second failure on the same index aborts the
    /// run and the accumulator is dropped with it. Unbounded retries would
    /// mask a systemic outage. Note the rebuilt handle may observe a
    /// rotated snapshot version; no identity check is made.
    ///
    /// # Errors
    /// Propagates open failures, a twice-failed fetch, and any
    /// non-fetch error immediately.
    pub fn run(&self, opener: &dyn TableOpener) -> Result<Extraction> {
        let mut table = opener.open_table()?;
        let partitions_total = table.partition_count();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut fragments = Vec::new();
        let mut rows_found = 0usize;

        for index in 0..partitions_total {
            if rng.gen::<f64>() >= self.probability {
                continue;
            }

            let fragment = match table.fetch_partition(index) {
                Ok(fragment) => fragment,
                Err(OccexError::Fetch { message, .. }) => {
                    warn!(
                        partition = index,
                        error = %message,
                        "partition fetch failed; re-authorizing and retrying once"
                    );
                    table = opener.open_table()?;
                    table.fetch_partition(index)?
                }
                Err(e) => return Err(e),
            };

            rows_found += fragment.num_rows();
            info!(
                partitions_seen = index + 1,
                partitions_fetched = fragments.len() + 1,
                rows_found,
                "partition sampled"
            );
            fragments.push(fragment);
        }

        Ok(Extraction {
            fragments,
            partitions_total,
        })
    }
}
