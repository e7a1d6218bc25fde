use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A completed round trip: entry followed by exit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub size: f64,
    pub pnl_after_commission: f64,
}

impl Trade {
    pub fn is_profit(&self) -> bool {
        self.pnl_after_commission >= 0.0
    }
}
