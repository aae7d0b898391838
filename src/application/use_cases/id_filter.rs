// ============================================================
// ID FILTER USE CASE
// ============================================================
// Keep only the rows whose id is in an allow-list

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::domain::csv::CsvTable;
use crate::domain::error::Result;
use crate::domain::settings::Settings;
use crate::infrastructure::csv::{CsvParser, CsvWriter};
use crate::infrastructure::storage::{ensure_parent_dir, filtered_output_path, load_id_set};

/// Outcome of a filter run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdFilterReport {
    /// Distinct ids loaded from the list
    pub loaded_ids: usize,
    /// Data records read, blank ones included
    pub total_rows: usize,
    /// Records written
    pub kept_rows: usize,
    pub output_path: PathBuf,
}

/// ID filter use case
pub struct IdFilterUseCase {
    id_field: String,
    delimiter: Option<u8>,
}

impl IdFilterUseCase {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            id_field: settings.fields.id.clone(),
            delimiter: settings.delimiter()?,
        })
    }

    /// Rows whose trimmed id is wanted, in input order, with the source
    /// hint line and header
    pub fn filter_table(&self, table: &CsvTable, wanted: &HashSet<String>) -> CsvTable {
        let mut filtered = CsvTable::with_layout_of(table);
        filtered.rows = table
            .rows
            .iter()
            .filter(|row| !row.is_blank())
            .filter(|row| {
                row.get_trimmed(&self.id_field)
                    .map_or(false, |id| wanted.contains(id))
            })
            .cloned()
            .collect();
        filtered
    }

    /// Load the id list, filter the input file and write the result
    pub fn run(&self, input: &Path, ids_file: &Path, output: Option<&Path>) -> Result<IdFilterReport> {
        let wanted = load_id_set(ids_file)?;
        tracing::info!(count = wanted.len(), "loaded ids from {}", ids_file.display());

        let table = CsvParser::new()
            .with_delimiter(self.delimiter)
            .parse_file(input)?;
        if !table.has_field(&self.id_field) {
            tracing::warn!(
                "{} has no '{}' column; no rows will be kept",
                input.display(),
                self.id_field
            );
        }

        let filtered = self.filter_table(&table, &wanted);

        let output_path = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| filtered_output_path(input));
        ensure_parent_dir(&output_path)?;
        CsvWriter::new()
            .with_crlf(true)
            .write_table_file(&output_path, &filtered)?;

        tracing::info!(
            total_rows = table.len(),
            kept_rows = filtered.len(),
            "filtered rows written to {}",
            output_path.display()
        );

        Ok(IdFilterReport {
            loaded_ids: wanted.len(),
            total_rows: table.len(),
            kept_rows: filtered.len(),
            output_path,
        })
    }
}
