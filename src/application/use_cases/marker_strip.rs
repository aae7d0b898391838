// ============================================================
// MARKER STRIP USE CASE
// ============================================================
// Rewrite the text column keeping only the region between markers

use std::path::Path;

use crate::domain::csv::CsvTable;
use crate::domain::error::Result;
use crate::domain::settings::Settings;
use crate::infrastructure::csv::{CsvParser, CsvWriter};
use crate::infrastructure::storage::ensure_parent_dir;
use crate::shared::markers::{MarkerDetector, MarkerStripper, StripOutcome};

/// Counts from a strip pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripReport {
    pub rows: usize,
    /// Values whose text changed
    pub changed: usize,
    /// Values kept as-is because stripping failed
    pub fallbacks: usize,
}

pub struct MarkerStripUseCase {
    text_field: String,
    stripper: MarkerStripper<MarkerDetector>,
    delimiter: Option<u8>,
}

impl MarkerStripUseCase {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            text_field: settings.fields.text.clone(),
            stripper: MarkerStripper::new(MarkerDetector::new(&settings.markers)?),
            delimiter: settings.delimiter()?,
        })
    }

    /// Strip the text field of every row in place. Absent values are left alone.
    pub fn strip_table(&self, table: &mut CsvTable) -> StripReport {
        let mut report = StripReport {
            rows: table.len(),
            ..StripReport::default()
        };

        for row in &mut table.rows {
            let outcome = match self.stripper.strip_field(row.get(&self.text_field)) {
                Some(outcome) => outcome,
                None => continue,
            };

            match outcome {
                StripOutcome::Stripped(text) => {
                    if row.get(&self.text_field) != Some(text.as_str()) {
                        report.changed += 1;
                        row.set(&self.text_field, Some(text));
                    }
                }
                StripOutcome::Fallback { .. } => report.fallbacks += 1,
            }
        }

        report
    }

    pub fn run(&self, input: &Path, output: &Path) -> Result<StripReport> {
        let mut table = CsvParser::new()
            .with_delimiter(self.delimiter)
            .parse_file(input)?;

        let report = self.strip_table(&mut table);

        ensure_parent_dir(output)?;
        CsvWriter::new()
            .with_crlf(true)
            .write_table_file(output, &table)?;

        tracing::info!(
            rows = report.rows,
            changed = report.changed,
            fallbacks = report.fallbacks,
            "stripped markers into {}",
            output.display()
        );
        Ok(report)
    }
}
