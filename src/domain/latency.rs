// ============================================================
// LATENCY COMPARISON
// ============================================================
// Grouping, quantile binning and percent differences between a
// "before" and an "after" set of latency samples. No I/O.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::domain::error::{AppError, Result};

/// One usable latency measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySample {
    pub word_count: f64,
    pub latency_seconds: f64,
}

impl LatencySample {
    pub fn new(word_count: f64, latency_seconds: f64) -> Self {
        Self {
            word_count,
            latency_seconds,
        }
    }
}

/// Word count usable as an ordered map key
#[derive(Debug, Clone, Copy)]
pub struct WordCount(pub f64);

impl PartialEq for WordCount {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for WordCount {}

impl PartialOrd for WordCount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WordCount {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Running count and sum of latencies
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupStats {
    pub count: usize,
    sum: f64,
}

impl GroupStats {
    pub fn push(&mut self, latency_seconds: f64) {
        self.count += 1;
        self.sum += latency_seconds;
    }

    /// Mean latency, `None` for an empty group
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// `(after - before) / before * 100`, absent when either side is missing or before is zero
pub fn diff_percent(before: Option<f64>, after: Option<f64>) -> Option<f64> {
    match (before, after) {
        (Some(before), Some(after)) if before != 0.0 => Some((after - before) / before * 100.0),
        _ => None,
    }
}

/// Group samples by exact word count, ascending
pub fn group_by_word_count(samples: &[LatencySample]) -> BTreeMap<WordCount, GroupStats> {
    let mut groups: BTreeMap<WordCount, GroupStats> = BTreeMap::new();
    for sample in samples {
        groups
            .entry(WordCount(sample.word_count))
            .or_default()
            .push(sample.latency_seconds);
    }
    groups
}

/// Word count present on both sides
#[derive(Debug, Clone, PartialEq)]
pub struct ExactDiffRow {
    pub word_count: f64,
    pub latency_seconds_before: f64,
    pub count_before: usize,
    pub latency_seconds_after: f64,
    pub count_after: usize,
    pub diff_percent: Option<f64>,
}

/// Inner join of the per-word-count means, ascending by word count
pub fn exact_diff(before: &[LatencySample], after: &[LatencySample]) -> Vec<ExactDiffRow> {
    let before_groups = group_by_word_count(before);
    let after_groups = group_by_word_count(after);

    before_groups
        .iter()
        .filter_map(|(word_count, b)| {
            let a = after_groups.get(word_count)?;
            let before_mean = b.mean()?;
            let after_mean = a.mean()?;
            Some(ExactDiffRow {
                word_count: word_count.0,
                latency_seconds_before: before_mean,
                count_before: b.count,
                latency_seconds_after: after_mean,
                count_after: a.count,
                diff_percent: diff_percent(Some(before_mean), Some(after_mean)),
            })
        })
        .collect()
}

/// Quantile edges at `0, 1/bins, ..., 1` with linear interpolation, duplicates dropped
pub fn quantile_edges(values: &[f64], bins: usize) -> Vec<f64> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let last = (sorted.len() - 1) as f64;

    let mut edges: Vec<f64> = (0..=bins)
        .map(|k| {
            let position = k as f64 / bins as f64 * last;
            let lower = position.floor() as usize;
            let upper = position.ceil() as usize;
            let fraction = position - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
        })
        .collect();
    edges.dedup();
    edges
}

/// Bin of `value` for right-closed intervals `(e[i], e[i+1]]`, the first one
/// also including `e[0]`. `None` outside the edges.
pub fn bin_index(edges: &[f64], value: f64) -> Option<usize> {
    let first = *edges.first()?;
    let last = *edges.last()?;
    if edges.len() < 2 || value < first || value > last {
        return None;
    }
    if value == first {
        return Some(0);
    }
    let upper = edges.partition_point(|edge| *edge < value);
    Some(upper - 1)
}

/// Per-bin comparison row
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedDiffRow {
    /// Exact lower quantile edge, unrounded. The first bin includes it.
    pub bin_start: f64,
    pub bin_end: f64,
    pub count_before: usize,
    pub count_after: usize,
    pub latency_seconds_before: Option<f64>,
    pub latency_seconds_after: Option<f64>,
    pub diff_percent: Option<f64>,
}

/// Compare mean latency per quantile bin of the combined word counts
pub fn binned_diff(
    before: &[LatencySample],
    after: &[LatencySample],
    bins: usize,
) -> Result<Vec<BinnedDiffRow>> {
    let combined: Vec<f64> = before
        .iter()
        .chain(after.iter())
        .map(|s| s.word_count)
        .collect();
    let edges = quantile_edges(&combined, bins);

    if edges.len() <= 2 {
        return Err(AppError::ValidationError(format!(
            "Not enough unique word_count values to create {} bins.",
            bins
        )));
    }

    let bin_count = edges.len() - 1;
    let accumulate = |samples: &[LatencySample]| {
        let mut stats = vec![GroupStats::default(); bin_count];
        for sample in samples {
            if let Some(idx) = bin_index(&edges, sample.word_count) {
                stats[idx].push(sample.latency_seconds);
            }
        }
        stats
    };
    let before_stats = accumulate(before);
    let after_stats = accumulate(after);

    Ok(edges
        .windows(2)
        .zip(before_stats.iter().zip(after_stats.iter()))
        .map(|(bounds, (b, a))| BinnedDiffRow {
            bin_start: bounds[0],
            bin_end: bounds[1],
            count_before: b.count,
            count_after: a.count,
            latency_seconds_before: b.mean(),
            latency_seconds_after: a.mean(),
            diff_percent: diff_percent(b.mean(), a.mean()),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(pairs: &[(f64, f64)]) -> Vec<LatencySample> {
        pairs
            .iter()
            .map(|&(w, l)| LatencySample::new(w, l))
            .collect()
    }

    #[test]
    fn test_diff_percent() {
        assert_eq!(diff_percent(Some(2.0), Some(3.0)), Some(50.0));
        assert_eq!(diff_percent(Some(0.0), Some(3.0)), None);
        assert_eq!(diff_percent(None, Some(3.0)), None);
    }

    #[test]
    fn test_exact_diff_inner_join() {
        let before = samples(&[(10.0, 1.0), (10.0, 3.0), (20.0, 4.0), (30.0, 1.0)]);
        let after = samples(&[(20.0, 2.0), (10.0, 1.0), (40.0, 9.0)]);

        let rows = exact_diff(&before, &after);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].word_count, 10.0);
        assert_eq!(rows[0].latency_seconds_before, 2.0);
        assert_eq!(rows[0].count_before, 2);
        assert_eq!(rows[0].count_after, 1);
        assert_eq!(rows[0].diff_percent, Some(-50.0));

        assert_eq!(rows[1].word_count, 20.0);
        assert_eq!(rows[1].diff_percent, Some(-50.0));
    }

    #[test]
    fn test_quantile_edges_interpolate() {
        let edges = quantile_edges(&[1.0, 2.0, 3.0, 4.0, 5.0], 4);
        assert_eq!(edges, vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        let edges = quantile_edges(&[0.0, 10.0], 4);
        assert_eq!(edges, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
    }

    #[test]
    fn test_quantile_edges_drop_duplicates() {
        let edges = quantile_edges(&[5.0, 5.0, 5.0, 5.0, 9.0], 4);
        assert_eq!(edges, vec![5.0, 9.0]);
    }

    #[test]
    fn test_bin_index_right_closed() {
        let edges = [1.0, 2.0, 3.0];
        assert_eq!(bin_index(&edges, 1.0), Some(0));
        assert_eq!(bin_index(&edges, 2.0), Some(0));
        assert_eq!(bin_index(&edges, 2.5), Some(1));
        assert_eq!(bin_index(&edges, 3.0), Some(1));
        assert_eq!(bin_index(&edges, 0.5), None);
        assert_eq!(bin_index(&edges, 3.5), None);
    }

    #[test]
    fn test_binned_diff_emits_every_bin() {
        let before = samples(&[(1.0, 1.0), (2.0, 1.0), (3.0, 2.0)]);
        let after = samples(&[(4.0, 3.0), (5.0, 5.0), (1.0, 2.0)]);

        let rows = binned_diff(&before, &after, 4).unwrap();
        assert!(rows.len() >= 2);
        assert_eq!(rows.first().unwrap().bin_start, 1.0);
        assert_eq!(rows.last().unwrap().bin_end, 5.0);

        let total_before: usize = rows.iter().map(|r| r.count_before).sum();
        let total_after: usize = rows.iter().map(|r| r.count_after).sum();
        assert_eq!(total_before, 3);
        assert_eq!(total_after, 3);

        let empty_before = rows.iter().find(|r| r.count_before == 0).unwrap();
        assert_eq!(empty_before.latency_seconds_before, None);
        assert_eq!(empty_before.diff_percent, None);
    }

    #[test]
    fn test_binned_diff_needs_distinct_word_counts() {
        let before = samples(&[(7.0, 1.0), (7.0, 2.0)]);
        let after = samples(&[(7.0, 1.0)]);
        assert!(matches!(
            binned_diff(&before, &after, 4),
            Err(AppError::ValidationError(_))
        ));
    }
}
