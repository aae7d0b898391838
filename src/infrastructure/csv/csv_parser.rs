// ============================================================
// CSV PARSER
// ============================================================
// Parse delimited files with lossy UTF-8 decoding, an optional
// `sep=` hint line, and delimiter detection from the header

use csv::{ReaderBuilder, StringRecord};
use std::path::Path;

use crate::domain::csv::{CsvField, CsvRow, CsvTable};
use crate::domain::error::{AppError, Result};

/// Delimiters considered by detection, in tie-break order
const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// CSV parser
#[derive(Debug, Clone, Default)]
pub struct CsvParser {
    /// Delimiter override; detected when `None`
    delimiter: Option<u8>,
}

impl CsvParser {
    /// Create a new CSV parser that detects the delimiter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear the delimiter override
    pub fn with_delimiter(mut self, delimiter: Option<u8>) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse a CSV file. The whole file is read and closed before parsing.
    pub fn parse_file(&self, path: &Path) -> Result<CsvTable> {
        let content = read_decoded(path)?;
        self.parse_content(&content).map_err(|e| match e {
            AppError::ValidationError(msg) => {
                AppError::ValidationError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Parse CSV content from string. A leading byte order mark is dropped.
    pub fn parse_content(&self, content: &str) -> Result<CsvTable> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let (separator_hint, body) = split_separator_hint(content);
        if body.trim().is_empty() {
            return Err(AppError::ValidationError("CSV has no header row.".to_string()));
        }

        let delimiter = self
            .delimiter
            .or_else(|| separator_hint.and_then(hint_delimiter))
            .unwrap_or_else(|| Self::detect_delimiter(first_line(body)));

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true) // Allow rows with different lengths
            .from_reader(body.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        if headers.is_empty() {
            return Err(AppError::ValidationError("CSV has no header row.".to_string()));
        }

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;
            rows.push(Self::parse_row(index, &headers, &record));
        }

        tracing::debug!(
            rows = rows.len(),
            columns = headers.len(),
            delimiter = %char::from(delimiter).escape_default(),
            "parsed CSV content"
        );

        Ok(CsvTable {
            separator_hint: separator_hint.map(str::to_string),
            delimiter,
            headers: headers.iter().map(str::to_string).collect(),
            rows,
        })
    }

    /// Map a record onto the header. Missing trailing values stay `None`;
    /// values beyond the header are kept aside as overflow.
    fn parse_row(index: usize, headers: &StringRecord, record: &StringRecord) -> CsvRow {
        let fields = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| CsvField::new(header, record.get(idx).map(str::to_string)))
            .collect();

        let overflow: Vec<String> = record.iter().skip(headers.len()).map(str::to_string).collect();
        if !overflow.is_empty() {
            tracing::debug!(
                row = index + 1,
                extra = overflow.len(),
                "record has more values than the header"
            );
        }

        CsvRow::new(index, fields).with_overflow(overflow)
    }

    /// Detect delimiter from the header line (comma, semicolon, tab, pipe).
    /// The most frequent candidate wins; comma when none occurs.
    pub fn detect_delimiter(header_line: &str) -> u8 {
        let mut best_delimiter = b',';
        let mut best_count = 0usize;

        for &delimiter in &DELIMITER_CANDIDATES {
            let count = header_line.bytes().filter(|&b| b == delimiter).count();
            if count > best_count {
                best_count = count;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }
}

/// Read a file and decode it as UTF-8, replacing invalid sequences
pub fn read_decoded(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            AppError::NotFound(format!("Missing input file: {}", path.display()))
        }
        _ => AppError::IoError(format!("Failed to read {}: {}", path.display(), e)),
    })?;

    let (content, _, had_errors) = encoding_rs::UTF_8.decode(&bytes);
    if had_errors {
        tracing::warn!(
            "{} contains invalid UTF-8; undecodable bytes were replaced",
            path.display()
        );
    }

    Ok(content.into_owned())
}

/// Split off a leading `sep=` line, keeping its line ending
fn split_separator_hint(content: &str) -> (Option<&str>, &str) {
    let line_end = content.find('\n').map_or(content.len(), |i| i + 1);
    let (line, rest) = content.split_at(line_end);

    let is_hint = line
        .get(..4)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("sep="));

    if is_hint {
        (Some(line), rest)
    } else {
        (None, content)
    }
}

/// Delimiter declared by a `sep=` line, if it names exactly one character
fn hint_delimiter(hint: &str) -> Option<u8> {
    let declared = hint.get(4..)?.trim_end_matches(&['\r', '\n'][..]);
    match declared.as_bytes() {
        [byte] if byte.is_ascii() => Some(*byte),
        _ => None,
    }
}

fn first_line(content: &str) -> &str {
    content.lines().next().unwrap_or("")
}
