// ============================================================
// MARKER SCAN USE CASE
// ============================================================
// Count rows whose free text carries a begin/end marker

use std::path::{Path, PathBuf};

use crate::domain::csv::CsvRow;
use crate::domain::error::Result;
use crate::domain::marker_stats::{MarkerScanReport, MarkerStats};
use crate::domain::settings::{FieldNames, Settings};
use crate::infrastructure::csv::CsvParser;
use crate::infrastructure::storage::write_lines;
use crate::shared::markers::MarkerDetector;

/// Marker scan use case
pub struct MarkerScanUseCase {
    fields: FieldNames,
    detector: MarkerDetector,
    delimiter: Option<u8>,
}

impl MarkerScanUseCase {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            fields: settings.fields.clone(),
            detector: MarkerDetector::new(&settings.markers)?,
            delimiter: settings.delimiter()?,
        })
    }

    /// Classify rows on their raw text. Blank rows are skipped.
    pub fn scan_rows<'a, I>(&self, rows: I) -> MarkerScanReport
    where
        I: IntoIterator<Item = &'a CsvRow>,
    {
        let mut stats = MarkerStats::new();

        for row in rows {
            if row.is_blank() {
                continue;
            }

            let matched = self.detector.detect(row.get(&self.fields.text));
            stats.record(
                row.get_trimmed(&self.fields.id),
                row.get_trimmed(&self.fields.user_id),
                matched,
            );
        }

        stats.finalize()
    }

    /// Parse and scan a CSV file
    pub fn scan_file(&self, path: &Path) -> Result<MarkerScanReport> {
        let table = CsvParser::new()
            .with_delimiter(self.delimiter)
            .parse_file(path)?;

        for field in [&self.fields.id, &self.fields.user_id, &self.fields.text] {
            if !table.has_field(field) {
                tracing::warn!(
                    "{} has no '{}' column; treating it as empty",
                    path.display(),
                    field
                );
            }
        }

        let report = self.scan_rows(&table.rows);
        tracing::info!(
            total_rows = report.summary.total_rows,
            matched_rows = report.summary.matched_rows,
            "marker scan finished for {}",
            path.display()
        );
        Ok(report)
    }

    /// Scan and, when an ids path is given, persist the matched ids there
    pub fn run(&self, input: &Path, ids_output: Option<&PathBuf>) -> Result<MarkerScanReport> {
        let report = self.scan_file(input)?;

        if let Some(ids_path) = ids_output {
            write_lines(ids_path, &report.matched_ids)?;
            tracing::info!(
                count = report.matched_ids.len(),
                "matched ids written to {}",
                ids_path.display()
            );
        }

        Ok(report)
    }
}
