// ============================================================
// CSV DOMAIN LAYER
// ============================================================
// Core types for delimited files
// No I/O

mod csv_row;

pub use csv_row::{CsvField, CsvRow, CsvTable};
