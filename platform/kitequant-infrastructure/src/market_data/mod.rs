use chrono::NaiveDate;
use kitequant_domain::repositories::market_data::BarQuery;
use kitequant_domain::services::ohlcv::DataQualityReport;
use kitequant_domain::value_objects::bar::Bar;

pub mod ohlcv_csv;
pub mod yahoo;

pub use ohlcv_csv::CsvMarketDataRepository;
pub use yahoo::YahooMarketDataRepository;

/// One parsed source row; `close` is `None` when the source had no usable value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawRow {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

/// Applies the query window and the quality bookkeeping shared by every source.
///
/// Rows stay in source order. Duplicates and out-of-order rows are counted but
/// kept, so the simulator rejects them instead of a silent reorder.
pub(crate) fn collect_bars<I>(rows: I, query: &BarQuery) -> (Vec<Bar>, DataQualityReport)
where
    I: IntoIterator<Item = RawRow>,
{
    let mut bars = Vec::new();
    let mut report = DataQualityReport::default();
    let mut last_date: Option<NaiveDate> = None;

    for row in rows {
        if !query.contains(row.date) {
            continue;
        }
        let close = match row.close {
            Some(close) if close.is_finite() && close > 0.0 => close,
            _ => {
                report.record_invalid_close(row.date);
                continue;
            }
        };
        report.record_row(last_date, row.date);
        last_date = Some(row.date);
        bars.push(Bar {
            date: row.date,
            open: row.open.unwrap_or(close),
            high: row.high.unwrap_or(close),
            low: row.low.unwrap_or(close),
            close,
            volume: row.volume.unwrap_or(0.0),
        });
    }

    (bars, report)
}
