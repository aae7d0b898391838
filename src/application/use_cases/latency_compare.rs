// ============================================================
// LATENCY COMPARE USE CASE
// ============================================================
// Compare humanize latency between two spreadsheets, per exact
// word count and per word-count quantile bin

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::csv::CsvTable;
use crate::domain::error::{AppError, Result};
use crate::domain::latency::{binned_diff, exact_diff, BinnedDiffRow, ExactDiffRow, LatencySample};
use crate::domain::settings::{LatencyConfig, Settings};
use crate::infrastructure::csv::CsvWriter;
use crate::infrastructure::spreadsheet::read_table;
use crate::infrastructure::storage::ensure_parent_dir;

const WORD_COUNT: &str = "word_count";
const LATENCY_SECONDS: &str = "latency_seconds";
const ACTION: &str = "action";

const EXACT_HEADERS: [&str; 6] = [
    "word_count",
    "latency_seconds_before",
    "count_before",
    "latency_seconds_after",
    "count_after",
    "diff_percent",
];

const BINNED_HEADERS: [&str; 7] = [
    "bin_start",
    "bin_end",
    "count_before",
    "count_after",
    "latency_seconds_before",
    "latency_seconds_after",
    "diff_percent",
];

/// Input and output locations of one comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencyPaths {
    pub before: PathBuf,
    pub after: PathBuf,
    pub exact_output: PathBuf,
    pub binned_output: PathBuf,
}

/// Both comparison tables
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyComparison {
    pub exact: Vec<ExactDiffRow>,
    pub binned: Vec<BinnedDiffRow>,
}

pub struct LatencyCompareUseCase {
    config: LatencyConfig,
    delimiter: Option<u8>,
}

impl LatencyCompareUseCase {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            config: settings.latency.clone(),
            delimiter: settings.delimiter()?,
        })
    }

    /// Samples with the configured action and numeric word count and latency
    pub fn samples_from_table(&self, table: &CsvTable, source: &str) -> Result<Vec<LatencySample>> {
        let columns: HashMap<String, &str> = table
            .headers
            .iter()
            .map(|h| (h.trim().to_lowercase(), h.as_str()))
            .collect();

        let missing: Vec<&str> = [WORD_COUNT, LATENCY_SECONDS, ACTION]
            .into_iter()
            .filter(|name| !columns.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::ValidationError(format!(
                "Missing columns in {}: {}",
                source,
                missing.join(", ")
            )));
        }

        let word_col = columns[WORD_COUNT];
        let latency_col = columns[LATENCY_SECONDS];
        let action_col = columns[ACTION];
        let wanted_action = self.config.action.trim().to_lowercase();

        let mut skipped = 0usize;
        let samples: Vec<LatencySample> = table
            .rows
            .iter()
            .filter(|row| {
                row.get(action_col)
                    .map_or(false, |a| a.trim().to_lowercase() == wanted_action)
            })
            .filter_map(|row| {
                let sample = parse_number(row.get(word_col))
                    .zip(parse_number(row.get(latency_col)))
                    .map(|(words, latency)| LatencySample::new(words, latency));
                if sample.is_none() {
                    skipped += 1;
                }
                sample
            })
            .collect();

        tracing::debug!(
            samples = samples.len(),
            skipped,
            "{} rows with action '{}' in {}",
            samples.len() + skipped,
            wanted_action,
            source
        );
        Ok(samples)
    }

    pub fn load_samples(&self, path: &Path) -> Result<Vec<LatencySample>> {
        let table = read_table(path, self.delimiter)?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.samples_from_table(&table, &source)
    }

    pub fn compare(
        &self,
        before: &[LatencySample],
        after: &[LatencySample],
    ) -> Result<LatencyComparison> {
        Ok(LatencyComparison {
            exact: exact_diff(before, after),
            binned: binned_diff(before, after, self.config.bins)?,
        })
    }

    /// Load both files, compare, and write both CSV outputs
    pub fn run(&self, paths: &LatencyPaths) -> Result<LatencyComparison> {
        for input in [&paths.before, &paths.after] {
            if !input.exists() {
                return Err(AppError::NotFound(format!(
                    "Missing input file: {}",
                    input.display()
                )));
            }
        }

        let before = self.load_samples(&paths.before)?;
        let after = self.load_samples(&paths.after)?;
        let comparison = self.compare(&before, &after)?;

        let writer = CsvWriter::new();

        ensure_parent_dir(&paths.exact_output)?;
        writer.write_records_file(
            &paths.exact_output,
            &EXACT_HEADERS,
            comparison.exact.iter().map(exact_record),
        )?;

        ensure_parent_dir(&paths.binned_output)?;
        writer.write_records_file(
            &paths.binned_output,
            &BINNED_HEADERS,
            comparison.binned.iter().map(binned_record),
        )?;

        tracing::info!(
            exact_rows = comparison.exact.len(),
            bins = comparison.binned.len(),
            "latency comparison written"
        );
        Ok(comparison)
    }
}

fn parse_number(value: Option<&str>) -> Option<f64> {
    value?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Integral values without a fraction, everything else as a float
fn format_count_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:?}", value)
    }
}

fn format_float(value: f64) -> String {
    format!("{:?}", value)
}

fn format_optional(value: Option<f64>) -> String {
    value.map(format_float).unwrap_or_default()
}

fn exact_record(row: &ExactDiffRow) -> Vec<String> {
    vec![
        format_count_value(row.word_count),
        format_float(row.latency_seconds_before),
        row.count_before.to_string(),
        format_float(row.latency_seconds_after),
        row.count_after.to_string(),
        format_optional(row.diff_percent),
    ]
}

fn binned_record(row: &BinnedDiffRow) -> Vec<String> {
    vec![
        format_float(row.bin_start),
        format_float(row.bin_end),
        row.count_before.to_string(),
        row.count_after.to_string(),
        format_optional(row.latency_seconds_before),
        format_optional(row.latency_seconds_after),
        format_optional(row.diff_percent),
    ]
}
