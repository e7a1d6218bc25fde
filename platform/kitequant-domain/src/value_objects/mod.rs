pub mod bar;
pub mod chart_marker;
pub mod equity_point;
pub mod position;
pub mod signal;
pub mod trade;
