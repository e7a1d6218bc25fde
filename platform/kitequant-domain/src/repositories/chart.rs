use crate::services::engine::simulator::SimulationResult;
use crate::value_objects::bar::Bar;
use serde::Serialize;
use std::path::Path;

/// Presentation settings handed to a renderer for one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartStyle {
    pub bar_up: String,
    pub bar_down: String,
    pub bar_alpha: f64,
    pub fast_color: String,
    pub slow_color: String,
    pub fast_label: String,
    pub slow_label: String,
    /// Adds the "how to read this" panel.
    pub explanations: bool,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            bar_up: "#5dba00".to_string(),
            bar_down: "#ff3d3d".to_string(),
            bar_alpha: 0.7,
            fast_color: "#1f77b4".to_string(),
            slow_color: "#ff7f0e".to_string(),
            fast_label: "Fast Trend".to_string(),
            slow_label: "Slow Trend".to_string(),
            explanations: true,
        }
    }
}

pub struct ChartInput<'a> {
    pub title: &'a str,
    pub symbol: &'a str,
    pub bars: &'a [Bar],
    pub result: &'a SimulationResult,
}

pub trait ChartRenderer {
    fn render(&self, path: &Path, input: &ChartInput<'_>, style: &ChartStyle)
        -> Result<(), String>;
}
