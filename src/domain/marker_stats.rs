// ============================================================
// MARKER STATISTICS
// ============================================================
// Per-scan accumulator for marker matches and its finalized summary

use std::collections::HashSet;
use std::fmt;

/// Counters and identifier sets accumulated while scanning rows
#[derive(Debug, Clone, Default)]
pub struct MarkerStats {
    total_rows: usize,
    matched_rows: usize,
    matched_ids: Vec<String>,
    matched_user_ids: HashSet<String>,
    all_user_ids: HashSet<String>,
}

impl MarkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one non-blank row.
    ///
    /// `row_id` and `user_id` must already be trimmed; `None` means absent.
    pub fn record(&mut self, row_id: Option<&str>, user_id: Option<&str>, matched: bool) {
        self.total_rows += 1;

        if let Some(user_id) = user_id {
            self.all_user_ids.insert(user_id.to_string());
        }

        if !matched {
            return;
        }

        self.matched_rows += 1;
        if let Some(row_id) = row_id {
            self.matched_ids.push(row_id.to_string());
        }
        if let Some(user_id) = user_id {
            self.matched_user_ids.insert(user_id.to_string());
        }
    }

    /// Compute the derived ratios. Pure, can be called any number of times.
    pub fn summary(&self) -> MarkerSummary {
        let frequency_percent = if self.total_rows > 0 {
            self.matched_rows as f64 / self.total_rows as f64 * 100.0
        } else {
            0.0
        };

        let unique_user_ratio = if self.all_user_ids.is_empty() {
            0.0
        } else {
            self.matched_user_ids.len() as f64 / self.all_user_ids.len() as f64
        };

        MarkerSummary {
            total_rows: self.total_rows,
            matched_rows: self.matched_rows,
            unique_user_ids: self.matched_user_ids.len(),
            unique_user_ratio,
            frequency_percent,
        }
    }

    /// Finish the scan, yielding matched row ids in scan order and the summary
    pub fn finalize(self) -> MarkerScanReport {
        let summary = self.summary();
        MarkerScanReport {
            matched_ids: self.matched_ids,
            summary,
        }
    }
}

/// Scalar statistics of a finished scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerSummary {
    pub total_rows: usize,
    pub matched_rows: usize,
    /// Distinct user ids among matched rows
    pub unique_user_ids: usize,
    /// Matched distinct users over all distinct users (0.0 - 1.0)
    pub unique_user_ratio: f64,
    /// Matched rows over total rows (0.0 - 100.0)
    pub frequency_percent: f64,
}

impl MarkerSummary {
    /// `key=value` lines as printed on the console
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("total_rows={}", self.total_rows),
            format!("matched_rows={}", self.matched_rows),
            format!("unique_user_ids={}", self.unique_user_ids),
            format!("unique_user_ratio={:.6}", self.unique_user_ratio),
            format!("frequency_percent={:.2}", self.frequency_percent),
        ]
    }
}

impl fmt::Display for MarkerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines().join("\n"))
    }
}

/// Final output of a marker scan
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerScanReport {
    /// Matched row ids, in scan order, duplicates kept
    pub matched_ids: Vec<String>,
    pub summary: MarkerSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_scan() {
        let summary = MarkerStats::new().summary();
        assert_eq!(summary.total_rows, 0);
        assert_eq!(summary.frequency_percent, 0.0);
        assert_eq!(summary.unique_user_ratio, 0.0);
    }

    #[test]
    fn test_duplicate_ids_kept_in_order() {
        let mut stats = MarkerStats::new();
        stats.record(Some("9"), Some("u1"), true);
        stats.record(Some("3"), Some("u1"), true);
        stats.record(Some("9"), Some("u2"), true);
        stats.record(None, None, true);

        let report = stats.finalize();
        assert_eq!(report.matched_ids, vec!["9", "3", "9"]);
        assert_eq!(report.summary.matched_rows, 4);
        assert_eq!(report.summary.unique_user_ids, 2);
    }

    #[test]
    fn test_ratios_stay_in_range() {
        let mut stats = MarkerStats::new();
        for i in 0..7 {
            let user = format!("u{}", i % 3);
            let id = i.to_string();
            stats.record(Some(id.as_str()), Some(user.as_str()), i % 2 == 0);
        }

        let summary = stats.summary();
        assert!(summary.matched_rows <= summary.total_rows);
        assert!((0.0..=100.0).contains(&summary.frequency_percent));
        assert!((0.0..=1.0).contains(&summary.unique_user_ratio));
        assert_eq!(summary, stats.summary());
    }

    #[test]
    fn test_summary_lines_format() {
        let summary = MarkerSummary {
            total_rows: 3,
            matched_rows: 2,
            unique_user_ids: 2,
            unique_user_ratio: 1.0,
            frequency_percent: 200.0 / 3.0,
        };
        assert_eq!(
            summary.lines(),
            vec![
                "total_rows=3",
                "matched_rows=2",
                "unique_user_ids=2",
                "unique_user_ratio=1.000000",
                "frequency_percent=66.67",
            ]
        );
    }
}
