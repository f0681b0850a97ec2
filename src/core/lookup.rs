use super::types::{MonthlySample, ProjectionSeries};

/// Resolves a query age to the first sample at or after it.
///
/// Queries past the end resolve to the last sample, queries before the start
/// to the first. This is called on every pointer move while the marker is
/// dragged, so it binary searches and never allocates.
pub fn nearest(series: &ProjectionSeries, query_age: f64) -> &MonthlySample {
    let samples = series.samples();
    &samples[ceiling_index(samples, query_age)]
}

/// Index of the smallest sample age `>= query_age`, clamped to the last index.
///
/// # Panics
///
/// Panics when `samples` is empty; an engine-built series always holds at
/// least one sample.
pub fn ceiling_index(samples: &[MonthlySample], query_age: f64) -> usize {
    assert!(
        !samples.is_empty(),
        "ceiling lookup on an empty projection series"
    );
    // A NaN query compares false everywhere and lands on index 0.
    let idx = samples.partition_point(|s| s.age < query_age);
    idx.min(samples.len() - 1)
}
