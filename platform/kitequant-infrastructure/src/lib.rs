pub mod artifacts;
pub mod chart;
pub mod market_data;
pub mod reporting;
