use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of OHLCV data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }

    /// Returns the reason the bar cannot be simulated, if any.
    pub fn validate(&self) -> Result<(), String> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) || !self.volume.is_finite() {
            return Err("non-finite price or volume".to_string());
        }
        if self.close <= 0.0 {
            return Err(format!("close must be > 0 (got {})", self.close));
        }
        if prices.iter().any(|p| *p < 0.0) {
            return Err("negative price".to_string());
        }
        if self.volume < 0.0 {
            return Err(format!("volume must be >= 0 (got {})", self.volume));
        }
        Ok(())
    }
}
