use crate::repositories::report_sink::ReportSink;
use crate::services::engine::simulator::{SimulationResult, TradeEvent};
use crate::value_objects::position::Position;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeReport {
    pub trade_index: usize,
    pub pnl_after_commission: f64,
    pub is_profit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinalReport {
    pub final_cash: f64,
    /// Cash plus any open position marked at the last close.
    pub final_value: f64,
    pub profit_total: f64,
    pub trade_count: usize,
}

/// Everything written to `summary.json` for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub initial_cash: f64,
    pub final_cash: f64,
    pub final_value: f64,
    pub profit_total: f64,
    pub trade_count: usize,
    pub win_rate: f64,
    pub max_drawdown: f64,
    pub bars_processed: usize,
    pub open_position: Option<Position>,
}

pub fn trade_reports(result: &SimulationResult) -> Vec<TradeReport> {
    result
        .events
        .iter()
        .filter_map(|event| match event {
            TradeEvent::Closed {
                trade_index, trade, ..
            } => Some(TradeReport {
                trade_index: *trade_index,
                pnl_after_commission: trade.pnl_after_commission,
                is_profit: trade.is_profit(),
            }),
            TradeEvent::Opened { .. } => None,
        })
        .collect()
}

pub fn final_report(result: &SimulationResult) -> FinalReport {
    FinalReport {
        final_cash: result.final_cash,
        final_value: result.final_value,
        profit_total: result.profit_total(),
        trade_count: result.trade_count(),
    }
}

pub fn run_summary(result: &SimulationResult) -> RunSummary {
    RunSummary {
        initial_cash: result.params.initial_cash,
        final_cash: result.final_cash,
        final_value: result.final_value,
        profit_total: result.summary.profit_total,
        trade_count: result.summary.trade_count,
        win_rate: result.summary.win_rate,
        max_drawdown: result.summary.max_drawdown,
        bars_processed: result.summary.bars_processed,
        open_position: result.open_position.clone(),
    }
}

/// Replays a finished run into `sink`: one call per closed trade, then the totals.
pub fn emit_report(result: &SimulationResult, sink: &mut dyn ReportSink) {
    for report in trade_reports(result) {
        sink.trade_closed(&report);
    }
    sink.finished(&final_report(result));
}
