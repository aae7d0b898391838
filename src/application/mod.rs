pub mod use_cases;

pub use use_cases::id_filter::IdFilterUseCase;
pub use use_cases::latency_compare::LatencyCompareUseCase;
pub use use_cases::marker_scan::MarkerScanUseCase;
pub use use_cases::marker_strip::MarkerStripUseCase;
