mod support;

use occex_client::SampledExtractor;
use occex_common::OccexError;
use support::{occurrence_batch, MockTable, ScriptedOpener};

fn ten_partitions() -> Vec<arrow::record_batch::RecordBatch> {
    (0..10)
        .map(|i| {
            occurrence_batch(&[(
                "2021-01-01",
                "Anura",
                -33.6,
                150.62 + 0.001 * (i as f64 + 1.0),
            )])
        })
        .collect()
}

#[test]
fn fetch_failure_is_retried_once_after_reauthorization() {
    // First authorization cycle fails on partition 7; the rebuilt handle
    // succeeds everywhere.
    let opener = ScriptedOpener::new(vec![
        MockTable::new(ten_partitions()).failing_on([7]),
        MockTable::new(ten_partitions()),
    ]);
    let extractor = SampledExtractor::new(1.0, 420).expect("extractor");

    let extraction = extractor.run(&opener).expect("run succeeds");

    assert_eq!(opener.opens(), 2);
    assert_eq!(extraction.partitions_total, 10);
    // Partition 7's rows appear exactly once.
    assert_eq!(extraction.fragments.len(), 10);
    let rows: usize = extraction.fragments.iter().map(|f| f.num_rows()).sum();
    assert_eq!(rows, 10);
}

#[test]
fn second_failure_on_the_same_partition_is_fatal() {
    let opener = ScriptedOpener::new(vec![
        MockTable::new(ten_partitions()).failing_on([3]),
        MockTable::new(ten_partitions()).failing_on([3]),
    ]);
    let extractor = SampledExtractor::new(1.0, 420).expect("extractor");

    let err = extractor.run(&opener).expect_err("second failure is fatal");
    assert!(matches!(err, OccexError::Fetch { partition: 3, .. }));
    assert_eq!(opener.opens(), 2, "exactly one re-authorization cycle");
}

#[test]
fn non_fetch_errors_are_not_retried() {
    // A healthy second table would turn a wrong retry into a wrong
    // success, so its presence proves no re-authorization happened.
    let opener = ScriptedOpener::new(vec![
        MockTable::new(ten_partitions()).misconfigured_on([2]),
        MockTable::new(ten_partitions()),
    ]);
    let extractor = SampledExtractor::new(1.0, 420).expect("extractor");

    let err = extractor.run(&opener).expect_err("config error propagates");
    assert!(matches!(err, OccexError::InvalidConfig(_)));
    assert_eq!(opener.opens(), 1);
}

#[test]
fn empty_table_extracts_nothing() {
    let opener = ScriptedOpener::new(vec![MockTable::new(Vec::new())]);
    let extractor = SampledExtractor::new(1.0, 420).expect("extractor");

    let extraction = extractor.run(&opener).expect("empty table run");
    assert_eq!(extraction.partitions_total, 0);
    assert!(extraction.fragments.is_empty());
    assert_eq!(opener.opens(), 1);
}

#[test]
fn failure_on_an_unsampled_partition_is_never_observed() {
    // With p small and a fixed seed, find an index that is not sampled and
    // make only that one fail: the run must not touch it.
    let extractor = SampledExtractor::new(0.3, 99).expect("extractor");
    let sampled = extractor.sampled_indices(10);
    let unsampled = (0..10)
        .find(|i| !sampled.contains(i))
        .expect("some partition unsampled");

    let opener = ScriptedOpener::new(vec![MockTable::new(ten_partitions())
        .failing_on([unsampled])]);
    let extraction = extractor.run(&opener).expect("run succeeds");
    assert_eq!(extraction.fragments.len(), sampled.len());
    assert_eq!(opener.opens(), 1);
}

#[test]
fn run_visits_the_same_indices_as_sampled_indices() {
    let extractor = SampledExtractor::new(0.4, 11).expect("extractor");
    let sampled = extractor.sampled_indices(10);

    // Every partition carries exactly one row whose longitude encodes its
    // index, so fetched fragments reveal the visited set.
    let partitions: Vec<_> = (0..10)
        .map(|i| occurrence_batch(&[("2021-01-01", "Anura", -33.6, 150.63 + 0.01 * i as f64)]))
        .collect();
    let opener = ScriptedOpener::new(vec![MockTable::new(partitions)]);

    let extraction = extractor.run(&opener).expect("run succeeds");
    assert_eq!(extraction.fragments.len(), sampled.len());
}
