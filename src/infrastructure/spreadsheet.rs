//! Workbook reading through calamine.
//!
//! The first worksheet is converted into the same `CsvTable` shape the CSV
//! parser produces; `.csv` files go straight through the CSV parser.

use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

use crate::domain::csv::{CsvField, CsvRow, CsvTable};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::csv::CsvParser;

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Read the first sheet of a workbook, or a CSV file, as a table
pub fn read_table(path: &Path, delimiter: Option<u8>) -> Result<CsvTable> {
    if !path.exists() {
        return Err(AppError::NotFound(format!(
            "Missing input file: {}",
            path.display()
        )));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        read_first_worksheet(path)
    } else {
        CsvParser::new().with_delimiter(delimiter).parse_file(path)
    }
}

fn read_first_worksheet(path: &Path) -> Result<CsvTable> {
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        AppError::ParseError(format!("Failed to open workbook {}: {}", path.display(), e))
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| {
            AppError::ValidationError(format!("No worksheet found in {}", path.display()))
        })??;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = match rows_iter.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| cell_to_string(cell).unwrap_or_default())
            .collect(),
        None => {
            return Err(AppError::ValidationError(format!(
                "{}: worksheet has no header row.",
                path.display()
            )))
        }
    };

    let rows = rows_iter
        .enumerate()
        .map(|(index, cells)| {
            let fields = headers
                .iter()
                .enumerate()
                .map(|(idx, name)| {
                    CsvField::new(name.as_str(), cells.get(idx).and_then(cell_to_string))
                })
                .collect();
            CsvRow::new(index, fields)
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        rows = rows.len(),
        columns = headers.len(),
        "read worksheet from {}",
        path.display()
    );

    Ok(CsvTable {
        separator_hint: None,
        delimiter: b',',
        headers,
        rows,
    })
}

/// Render a cell as text; empty cells are absent
fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        other => Some(other.to_string()),
    }
}
