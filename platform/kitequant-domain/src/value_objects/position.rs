use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub size: f64,
    /// Cash committed at entry, entry commission included.
    pub entry_cost: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.size * price
    }
}
