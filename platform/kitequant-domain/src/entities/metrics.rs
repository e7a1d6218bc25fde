use crate::value_objects::equity_point::EquityPoint;
use crate::value_objects::trade::Trade;
use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub bars_processed: usize,
    pub trade_count: usize,
    pub winning_trades: usize,
    pub win_rate: f64,
    pub profit_total: f64,
    pub max_drawdown: f64,
}

#[derive(Debug, Default, Clone)]
pub struct MetricsState {
    bars_processed: usize,
    trade_count: usize,
    winning_trades: usize,
    profit_total: f64,
    peak_equity: f64,
    max_drawdown: f64,
}

impl MetricsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_equity(&mut self, point: &EquityPoint) {
        self.bars_processed += 1;
        if self.peak_equity == 0.0 || point.equity > self.peak_equity {
            self.peak_equity = point.equity;
        } else if self.peak_equity > 0.0 {
            let drawdown = (self.peak_equity - point.equity) / self.peak_equity;
            if drawdown > self.max_drawdown {
                self.max_drawdown = drawdown;
            }
        }
    }

    pub fn record_trade(&mut self, trade: &Trade) {
        self.trade_count += 1;
        if trade.is_profit() {
            self.winning_trades += 1;
        }
        self.profit_total += trade.pnl_after_commission;
    }

    pub fn bars_processed(&self) -> usize {
        self.bars_processed
    }

    pub fn summary(&self) -> MetricsSummary {
        let win_rate = if self.trade_count == 0 {
            0.0
        } else {
            self.winning_trades as f64 / self.trade_count as f64
        };

        MetricsSummary {
            bars_processed: self.bars_processed,
            trade_count: self.trade_count,
            winning_trades: self.winning_trades,
            win_rate,
            profit_total: self.profit_total,
            max_drawdown: self.max_drawdown,
        }
    }
}
