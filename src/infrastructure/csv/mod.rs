// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// CSV parsing, lossy decoding, and writing

mod csv_parser;
mod csv_writer;

pub use csv_parser::{read_decoded, CsvParser};
pub use csv_writer::CsvWriter;
