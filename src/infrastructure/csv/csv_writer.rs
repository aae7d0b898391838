// ============================================================
// CSV WRITER
// ============================================================
// Persist tables, replaying the source `sep=` hint line verbatim

use csv::{Terminator, WriterBuilder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::csv::CsvTable;
use crate::domain::error::{AppError, Result};

/// CSV writer
#[derive(Debug, Clone, Default)]
pub struct CsvWriter {
    /// Terminate records with `\r\n` instead of `\n`
    crlf: bool,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_crlf(mut self, crlf: bool) -> Self {
        self.crlf = crlf;
        self
    }

    /// Write a table to a file: hint line, header, then rows
    pub fn write_table_file(&self, path: &Path, table: &CsvTable) -> Result<()> {
        let file = create_file(path)?;
        self.write_table(BufWriter::new(file), table)
    }

    /// Write a table using its own delimiter
    pub fn write_table<W: Write>(&self, mut out: W, table: &CsvTable) -> Result<()> {
        if let Some(hint) = &table.separator_hint {
            out.write_all(hint.as_bytes())?;
        }

        let mut writer = self.builder(table.delimiter).from_writer(out);
        writer.write_record(&table.headers)?;
        for row in &table.rows {
            writer.write_record(row.values())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write a header and plain comma-separated records to a file
    pub fn write_records_file<I>(&self, path: &Path, headers: &[&str], records: I) -> Result<()>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let file = create_file(path)?;
        let mut writer = self.builder(b',').from_writer(BufWriter::new(file));
        writer.write_record(headers)?;
        for record in records {
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn builder(&self, delimiter: u8) -> WriterBuilder {
        let mut builder = WriterBuilder::new();
        builder.delimiter(delimiter).flexible(false);
        if self.crlf {
            builder.terminator(Terminator::CRLF);
        }
        builder
    }
}

fn create_file(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| {
        AppError::IoError(format!("Failed to create {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::csv::{CsvField, CsvRow};

    fn sample_table() -> CsvTable {
        CsvTable {
            separator_hint: Some("sep=;\n".to_string()),
            delimiter: b';',
            headers: vec!["id".to_string(), "text".to_string()],
            rows: vec![
                CsvRow::from_pairs(0, [("id", "1"), ("text", "a;b")]),
                CsvRow::new(
                    1,
                    vec![CsvField::new("id", Some("2".to_string())), CsvField::new("text", None)],
                ),
            ],
        }
    }

    #[test]
    fn test_write_table_keeps_hint_and_quotes() {
        let mut buffer = Vec::new();
        CsvWriter::new().write_table(&mut buffer, &sample_table()).unwrap();

        let written = String::from_utf8(buffer).unwrap();
        assert_eq!(written, "sep=;\nid;text\n1;\"a;b\"\n2;\n");
    }

    #[test]
    fn test_crlf_terminator() {
        let mut table = sample_table();
        table.separator_hint = None;
        table.rows.truncate(1);

        let mut buffer = Vec::new();
        CsvWriter::new()
            .with_crlf(true)
            .write_table(&mut buffer, &table)
            .unwrap();

        assert_eq!(String::from_utf8(buffer).unwrap(), "id;text\r\n1;\"a;b\"\r\n");
    }

    #[test]
    fn test_write_records_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        CsvWriter::new()
            .write_records_file(
                &path,
                &["a", "b"],
                vec![vec!["1".to_string(), String::new()]],
            )
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a,b\n1,\n");
    }
}
