use crate::value_objects::position::Position;
use crate::value_objects::trade::Trade;
use chrono::NaiveDate;

/// At most one position is ever open, so the account is either flat or long.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionState {
    Flat,
    Long(Position),
}

impl PositionState {
    pub fn is_long(&self) -> bool {
        matches!(self, PositionState::Long(_))
    }

    pub fn position(&self) -> Option<&Position> {
        match self {
            PositionState::Flat => None,
            PositionState::Long(position) => Some(position),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    cash: f64,
    commission_rate: f64,
    state: PositionState,
}

impl Account {
    pub fn new(initial_cash: f64, commission_rate: f64) -> Self {
        Self {
            cash: initial_cash,
            commission_rate,
            state: PositionState::Flat,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn commission_rate(&self) -> f64 {
        self.commission_rate
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn position_size(&self) -> f64 {
        self.state.position().map(|pos| pos.size).unwrap_or(0.0)
    }

    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.state.position().map_or(0.0, |pos| pos.market_value(price))
    }

    /// Commits `cash * risk_fraction` to a new long position at `price`.
    /// Returns `None` when a position is already open or when there is no
    /// positive cash left to commit.
    pub fn open_long(&mut self, date: NaiveDate, price: f64, risk_fraction: f64) -> Option<Position> {
        if self.state.is_long() {
            return None;
        }

        let cash_to_use = self.cash * risk_fraction;
        let size = cash_to_use / price;
        if cash_to_use <= 0.0 || !size.is_finite() || size <= 0.0 {
            return None;
        }
        let entry_cost = cash_to_use * (1.0 + self.commission_rate);
        let position = Position {
            entry_date: date,
            entry_price: price,
            size,
            entry_cost,
        };
        self.cash -= entry_cost;
        self.state = PositionState::Long(position.clone());
        Some(position)
    }

    /// Squares off the open position at `price`. Returns `None` when flat.
    pub fn close_long(&mut self, date: NaiveDate, price: f64) -> Option<Trade> {
        let PositionState::Long(position) = std::mem::replace(&mut self.state, PositionState::Flat)
        else {
            return None;
        };

        let proceeds = position.size * price * (1.0 - self.commission_rate);
        self.cash += proceeds;
        Some(Trade {
            entry_date: position.entry_date,
            exit_date: date,
            entry_price: position.entry_price,
            exit_price: price,
            size: position.size,
            pnl_after_commission: proceeds - position.entry_cost,
        })
    }
}
