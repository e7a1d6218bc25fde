use crate::value_objects::bar::Bar;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DataQualityReport {
    pub rows: usize,
    pub duplicates: usize,
    pub out_of_order: usize,
    pub invalid_close: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub first_duplicate: Option<NaiveDate>,
    pub first_out_of_order: Option<NaiveDate>,
    pub first_invalid_close: Option<NaiveDate>,
}

impl DataQualityReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates == 0 && self.out_of_order == 0 && self.invalid_close == 0
    }

    pub fn record_invalid_close(&mut self, date: NaiveDate) {
        self.invalid_close += 1;
        if self.first_invalid_close.is_none() {
            self.first_invalid_close = Some(date);
        }
    }

    /// Tracks ordering of an accepted row against the previous accepted row.
    pub fn record_row(&mut self, previous: Option<NaiveDate>, date: NaiveDate) {
        self.rows += 1;
        if self.first_date.is_none() {
            self.first_date = Some(date);
        }
        self.last_date = Some(date);

        let Some(prev) = previous else {
            return;
        };
        if date == prev {
            self.duplicates += 1;
            if self.first_duplicate.is_none() {
                self.first_duplicate = Some(date);
            }
        } else if date < prev {
            self.out_of_order += 1;
            if self.first_out_of_order.is_none() {
                self.first_out_of_order = Some(date);
            }
        }
    }
}

pub fn data_quality_from_bars(bars: &[Bar]) -> DataQualityReport {
    let mut report = DataQualityReport::default();
    let mut last_date: Option<NaiveDate> = None;

    for bar in bars {
        if !bar.close.is_finite() || bar.close <= 0.0 {
            report.record_invalid_close(bar.date);
            continue;
        }
        report.record_row(last_date, bar.date);
        last_date = Some(bar.date);
    }

    report
}
