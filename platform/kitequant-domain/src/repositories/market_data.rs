use crate::services::ohlcv::DataQualityReport;
use crate::value_objects::bar::Bar;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct BarQuery {
    pub symbol: String,
    /// Inclusive.
    pub start: NaiveDate,
    /// Inclusive.
    pub end: NaiveDate,
}

impl BarQuery {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

pub trait MarketDataRepository {
    fn load_bars(&self, query: &BarQuery) -> Result<(Vec<Bar>, DataQualityReport), String>;
}
