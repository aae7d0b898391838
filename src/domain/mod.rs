pub mod error;
pub mod latency;
pub mod marker_stats;
pub mod settings;

// Tabular rows and tables
pub mod csv;
