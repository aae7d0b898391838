pub mod id_filter;
pub mod latency_compare;
pub mod marker_scan;
pub mod marker_strip;
