// ============================================================
// CSV ROW TYPES
// ============================================================
// Data structures representing parsed tabular content

/// A single field in a CSV row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvField {
    /// Field name (header)
    pub name: String,

    /// Field value, `None` when the record is shorter than the header
    pub value: Option<String>,
}

impl CsvField {
    /// Create a new CSV field
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Whether the value is absent or whitespace only
    pub fn is_blank(&self) -> bool {
        self.value.as_deref().map_or(true, |v| v.trim().is_empty())
    }
}

/// A single data row, fields ordered as in the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    /// Row index (0-based, header excluded)
    pub index: usize,

    /// All fields in this row
    pub fields: Vec<CsvField>,

    /// Values past the end of the header. They count towards blankness
    /// but are never written back.
    pub overflow: Vec<String>,
}

impl CsvRow {
    /// Create a new CSV row
    pub fn new(index: usize, fields: Vec<CsvField>) -> Self {
        Self {
            index,
            fields,
            overflow: Vec::new(),
        }
    }

    pub fn with_overflow(mut self, overflow: Vec<String>) -> Self {
        self.overflow = overflow;
        self
    }

    /// Build a row from `(name, value)` pairs
    pub fn from_pairs<'a>(index: usize, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let fields = pairs
            .into_iter()
            .map(|(name, value)| CsvField::new(name, Some(value.to_string())))
            .collect();
        Self::new(index, fields)
    }

    /// Raw value of a field. Unknown field and missing value are both `None`.
    /// With repeated header names the last column wins.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|f| f.name == name)
            .and_then(|f| f.value.as_deref())
    }

    /// Trimmed value of a field, `None` when absent or empty after trimming
    pub fn get_trimmed(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Replace the value of an existing field. Returns false if the field is unknown.
    pub fn set(&mut self, name: &str, value: Option<String>) -> bool {
        match self.fields.iter_mut().rev().find(|f| f.name == name) {
            Some(field) => {
                field.value = value;
                true
            }
            None => false,
        }
    }

    /// True when every value, overflow included, is absent or whitespace
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(CsvField::is_blank)
            && self.overflow.iter().all(|v| v.trim().is_empty())
    }

    /// Values in header order, absent values rendered as empty strings
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.value.as_deref().unwrap_or(""))
    }
}

/// A parsed delimited file
#[derive(Debug, Clone)]
pub struct CsvTable {
    /// Literal `sep=` line (including its line ending) found before the header
    pub separator_hint: Option<String>,

    /// Delimiter used to parse the file
    pub delimiter: u8,

    /// Original headers, in file order
    pub headers: Vec<String>,

    /// Data rows, in file order
    pub rows: Vec<CsvRow>,
}

impl CsvTable {
    /// Empty table that keeps the source layout (hint line, delimiter, header)
    pub fn with_layout_of(source: &CsvTable) -> Self {
        Self {
            separator_hint: source.separator_hint.clone(),
            delimiter: source.delimiter,
            headers: source.headers.clone(),
            rows: Vec::new(),
        }
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the header contains the given field
    pub fn has_field(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }
}
