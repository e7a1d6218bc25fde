use crate::entities::account::{Account, PositionState};
use crate::entities::metrics::{MetricsState, MetricsSummary};
use crate::errors::SimulationError;
use crate::services::crossover::CrossoverDetector;
use crate::services::market_data_source::BarSource;
use crate::value_objects::bar::Bar;
use crate::value_objects::chart_marker::{ChartMarker, MarkerKind};
use crate::value_objects::equity_point::EquityPoint;
use crate::value_objects::position::Position;
use crate::value_objects::signal::Crossover;
use crate::value_objects::trade::Trade;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationParams {
    pub fast_period: usize,
    pub slow_period: usize,
    pub initial_cash: f64,
    pub risk_fraction: f64,
    pub commission_rate: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            fast_period: 20,
            slow_period: 50,
            initial_cash: 50_000.0,
            risk_fraction: 0.95,
            commission_rate: 0.001,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> Result<(), SimulationError> {
        let invalid = |msg: String| Err(SimulationError::InvalidConfiguration(msg));

        if self.fast_period == 0 {
            return invalid("fast_period must be > 0".to_string());
        }
        if self.fast_period >= self.slow_period {
            return invalid(format!(
                "fast_period ({}) must be < slow_period ({})",
                self.fast_period, self.slow_period
            ));
        }
        if !self.initial_cash.is_finite() || self.initial_cash <= 0.0 {
            return invalid(format!(
                "initial_cash must be finite and > 0 (got {})",
                self.initial_cash
            ));
        }
        if !(self.risk_fraction > 0.0 && self.risk_fraction <= 1.0) {
            return invalid(format!(
                "risk_fraction must be in (0, 1] (got {})",
                self.risk_fraction
            ));
        }
        if !(self.commission_rate >= 0.0 && self.commission_rate < 1.0) {
            return invalid(format!(
                "commission_rate must be in [0, 1) (got {})",
                self.commission_rate
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TradeEvent {
    Opened {
        bar_index: usize,
        position: Position,
    },
    Closed {
        bar_index: usize,
        /// 1-based, in closing order.
        trade_index: usize,
        trade: Trade,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub params: SimulationParams,
    pub events: Vec<TradeEvent>,
    pub trades: Vec<Trade>,
    /// Still open when the data ran out; never force-closed.
    pub open_position: Option<Position>,
    pub equity: Vec<EquityPoint>,
    pub summary: MetricsSummary,
    pub final_cash: f64,
    /// Cash plus the open position marked at the last close.
    pub final_value: f64,
}

impl SimulationResult {
    pub fn trade_count(&self) -> usize {
        self.summary.trade_count
    }

    pub fn profit_total(&self) -> f64 {
        self.summary.profit_total
    }

    pub fn markers(&self) -> Vec<ChartMarker> {
        self.events
            .iter()
            .map(|event| match event {
                TradeEvent::Opened { position, .. } => ChartMarker {
                    date: position.entry_date,
                    price: position.entry_price,
                    kind: MarkerKind::Buy,
                },
                TradeEvent::Closed { trade, .. } => ChartMarker {
                    date: trade.exit_date,
                    price: trade.exit_price,
                    kind: MarkerKind::Sell,
                },
            })
            .collect()
    }
}

/// Golden-cross simulator over one instrument and one account.
#[derive(Debug)]
pub struct CrossoverSimulator {
    params: SimulationParams,
    detector: CrossoverDetector,
    account: Account,
    metrics: MetricsState,
    events: Vec<TradeEvent>,
    trades: Vec<Trade>,
    equity: Vec<EquityPoint>,
    last_bar: Option<(NaiveDate, f64)>,
}

impl CrossoverSimulator {
    pub fn new(params: SimulationParams) -> Result<Self, SimulationError> {
        params.validate()?;
        Ok(Self {
            params,
            detector: CrossoverDetector::new(params.fast_period, params.slow_period),
            account: Account::new(params.initial_cash, params.commission_rate),
            metrics: MetricsState::new(),
            events: Vec::new(),
            trades: Vec::new(),
            equity: Vec::new(),
            last_bar: None,
        })
    }

    pub fn run<I>(params: SimulationParams, bars: I) -> Result<SimulationResult, SimulationError>
    where
        I: IntoIterator<Item = Bar>,
    {
        let mut simulator = Self::new(params)?;
        for bar in bars {
            simulator.on_bar(&bar)?;
        }
        Ok(simulator.finish())
    }

    pub fn run_source<D>(
        params: SimulationParams,
        source: &mut D,
    ) -> Result<SimulationResult, SimulationError>
    where
        D: BarSource + ?Sized,
    {
        let mut simulator = Self::new(params)?;
        while let Some(bar) = source.next_bar() {
            simulator.on_bar(&bar)?;
        }
        Ok(simulator.finish())
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn state(&self) -> &PositionState {
        self.account.state()
    }

    pub fn cash(&self) -> f64 {
        self.account.cash()
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn statistics(&self) -> Result<MetricsSummary, SimulationError> {
        if self.metrics.bars_processed() == 0 {
            return Err(SimulationError::InsufficientData);
        }
        Ok(self.metrics.summary())
    }

    /// Processes one bar. Rejected bars leave the simulator untouched.
    pub fn on_bar(&mut self, bar: &Bar) -> Result<Option<TradeEvent>, SimulationError> {
        let index = self.metrics.bars_processed();
        if let Some((previous, _)) = self.last_bar {
            if bar.date <= previous {
                return Err(SimulationError::DataGap {
                    index,
                    previous,
                    current: bar.date,
                });
            }
        }
        bar.validate()
            .map_err(|reason| SimulationError::InvalidBar {
                index,
                date: bar.date,
                reason,
            })?;

        let update = self.detector.update(bar.close);
        let event = match update.crossover {
            Some(Crossover::Buy) => self
                .account
                .open_long(bar.date, bar.close, self.params.risk_fraction)
                .map(|position| TradeEvent::Opened {
                    bar_index: index,
                    position,
                }),
            Some(Crossover::Sell) => match self.account.close_long(bar.date, bar.close) {
                Some(trade) => {
                    self.metrics.record_trade(&trade);
                    self.trades.push(trade.clone());
                    Some(TradeEvent::Closed {
                        bar_index: index,
                        trade_index: self.trades.len(),
                        trade,
                    })
                }
                None => None,
            },
            None => None,
        };
        if let Some(event) = &event {
            self.events.push(event.clone());
        }

        let point = EquityPoint {
            date: bar.date,
            close: bar.close,
            fast_sma: update.fast,
            slow_sma: update.slow,
            cash: self.account.cash(),
            position_size: self.account.position_size(),
            equity: self.account.equity(bar.close),
        };
        self.metrics.record_equity(&point);
        self.equity.push(point);
        self.last_bar = Some((bar.date, bar.close));

        Ok(event)
    }

    pub fn finish(self) -> SimulationResult {
        let final_cash = self.account.cash();
        let final_value = self
            .last_bar
            .map_or(final_cash, |(_, close)| self.account.equity(close));

        SimulationResult {
            params: self.params,
            events: self.events,
            trades: self.trades,
            open_position: self.account.state().position().cloned(),
            equity: self.equity,
            summary: self.metrics.summary(),
            final_cash,
            final_value,
        }
    }
}
