use super::{collect_bars, RawRow};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use kitequant_domain::repositories::market_data::{BarQuery, MarketDataRepository};
use kitequant_domain::services::ohlcv::DataQualityReport;
use kitequant_domain::value_objects::bar::Bar;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

const DATE_COLUMNS: &[&str] = &["date", "datetime", "timestamp", "timestamp_utc"];

/// Daily bars from a local CSV export (`date,open,high,low,close,volume`).
#[derive(Debug, Clone)]
pub struct CsvMarketDataRepository {
    path: PathBuf,
}

impl CsvMarketDataRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MarketDataRepository for CsvMarketDataRepository {
    fn load_bars(&self, query: &BarQuery) -> Result<(Vec<Bar>, DataQualityReport), String> {
        let start = Instant::now();
        let result = load_csv(&self.path, query);
        let result_label = if result.is_ok() { "ok" } else { "err" };
        metrics::histogram!(
            "kitequant.infra.market_data.load_ms",
            "source" => "csv",
            "result" => result_label
        )
        .record(start.elapsed().as_millis() as f64);
        result
    }
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, String> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|header| names.contains(&header.trim().to_lowercase().as_str()))
        };
        Ok(Self {
            date: find(DATE_COLUMNS)
                .ok_or_else(|| "CSV header is missing a date column".to_string())?,
            open: find(&["open"]),
            high: find(&["high"]),
            low: find(&["low"]),
            close: find(&["close"])
                .ok_or_else(|| "CSV header is missing a close column".to_string())?,
            volume: find(&["volume"]),
        })
    }
}

pub fn load_csv(path: &Path, query: &BarQuery) -> Result<(Vec<Bar>, DataQualityReport), String> {
    let file = File::open(path)
        .map_err(|err| format!("failed to open OHLCV CSV {}: {}", path.display(), err))?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let headers = reader
        .headers()
        .map_err(|err| format!("failed to read CSV header {}: {}", path.display(), err))?
        .clone();
    let columns = Columns::from_headers(&headers)
        .map_err(|err| format!("{} ({})", err, path.display()))?;

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|err| format!("failed to parse CSV row: {}", err))?;
        rows.push(parse_row(&record, &columns).map_err(|err| {
            // +2: header line and 1-based numbering.
            format!("{}:{}: {}", path.display(), idx + 2, err)
        })?);
    }
    debug!(rows = rows.len(), path = %path.display(), "read OHLCV CSV");

    Ok(collect_bars(rows, query))
}

fn parse_row(record: &csv::StringRecord, columns: &Columns) -> Result<RawRow, String> {
    let field = |idx: Option<usize>| idx.and_then(|idx| record.get(idx));
    let date_field = field(Some(columns.date)).unwrap_or("");
    Ok(RawRow {
        date: parse_date(date_field)?,
        open: parse_number(field(columns.open), "open")?,
        high: parse_number(field(columns.high), "high")?,
        low: parse_number(field(columns.low), "low")?,
        // A close the source could not provide is a quality finding, not a parse error.
        close: parse_number(field(Some(columns.close)), "close").unwrap_or(None),
        volume: parse_number(field(columns.volume), "volume")?,
    })
}

fn parse_number(value: Option<&str>, name: &str) -> Result<Option<f64>, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) if raw.eq_ignore_ascii_case("null") => Ok(None),
        Some(raw) => raw
            .parse::<f64>()
            .map(Some)
            .map_err(|err| format!("invalid {name} '{raw}': {err}")),
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%z") {
        return Ok(dt.date_naive());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.date());
    }

    Err(format!("unsupported date format: {}", value))
}

#[cfg(test)]
mod tests {
    use super::{parse_date, CsvMarketDataRepository};
    use chrono::NaiveDate;
    use kitequant_domain::repositories::market_data::{BarQuery, MarketDataRepository};
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_tmp_path(name: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("kitequant_{name}_{}_{}", std::process::id(), now))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    fn query(start: NaiveDate, end: NaiveDate) -> BarQuery {
        BarQuery {
            symbol: "DEMO".to_string(),
            start,
            end,
        }
    }

    #[test]
    fn loads_yahoo_style_export_with_capitalised_headers() {
        let path = unique_tmp_path("ohlcv_caps.csv");
        let csv_data = "Date,Open,High,Low,Close,Adj Close,Volume\n\
2023-01-02,10,11,9,10.5,10.4,1000\n\
2023-01-03,10.5,12,10,11.5,11.4,2000\n\
2023-01-04,11.5,12,11,,,0\n";
        fs::write(&path, csv_data).expect("write csv");

        let repo = CsvMarketDataRepository::new(&path);
        let (bars, report) = repo
            .load_bars(&query(date(2023, 1, 1), date(2023, 12, 31)))
            .expect("load csv");
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 11.5);
        assert_eq!(bars[1].volume, 2000.0);
        assert_eq!(report.invalid_close, 1);
        assert_eq!(report.first_date, Some(date(2023, 1, 2)));
        assert_eq!(report.last_date, Some(date(2023, 1, 3)));
    }

    #[test]
    fn keeps_file_order_and_reports_ordering_issues() {
        let path = unique_tmp_path("ohlcv_order.csv");
        let csv_data = "date,open,high,low,close,volume\n\
2023-01-03,1,1,1,3,1\n\
2023-01-02,1,1,1,2,1\n\
2023-01-02,1,1,1,2.5,1\n";
        fs::write(&path, csv_data).expect("write csv");

        let (bars, report) = CsvMarketDataRepository::new(&path)
            .load_bars(&query(date(2023, 1, 1), date(2023, 1, 31)))
            .expect("load csv");
        let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
        assert_eq!(closes, vec![3.0, 2.0, 2.5]);
        assert_eq!(report.out_of_order, 1);
        assert_eq!(report.duplicates, 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn applies_inclusive_date_window() {
        let path = unique_tmp_path("ohlcv_window.csv");
        let csv_data = "date,open,high,low,close,volume\n\
2023-01-01T00:00:00Z,1,1,1,1,1\n\
2023-01-02T00:00:00Z,1,1,1,2,1\n\
2023-01-03T00:00:00Z,1,1,1,3,1\n\
2023-01-04T00:00:00Z,1,1,1,4,1\n";
        fs::write(&path, csv_data).expect("write csv");

        let (bars, _) = CsvMarketDataRepository::new(&path)
            .load_bars(&query(date(2023, 1, 2), date(2023, 1, 3)))
            .expect("load csv");
        let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
        assert_eq!(closes, vec![2.0, 3.0]);
    }

    #[test]
    fn rejects_missing_close_column_and_bad_numbers() {
        let path = unique_tmp_path("ohlcv_no_close.csv");
        fs::write(&path, "date,open\n2023-01-02,1\n").expect("write csv");
        let err = CsvMarketDataRepository::new(&path)
            .load_bars(&query(date(2023, 1, 1), date(2023, 1, 31)))
            .expect_err("no close column");
        assert!(err.contains("close column"));

        let path = unique_tmp_path("ohlcv_bad_open.csv");
        fs::write(&path, "date,open,close\n2023-01-02,abc,1\n").expect("write csv");
        let err = CsvMarketDataRepository::new(&path)
            .load_bars(&query(date(2023, 1, 1), date(2023, 1, 31)))
            .expect_err("bad open");
        assert!(err.contains(":2:"));
        assert!(err.contains("invalid open"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = CsvMarketDataRepository::new(unique_tmp_path("does_not_exist.csv"))
            .load_bars(&query(date(2023, 1, 1), date(2023, 1, 31)))
            .expect_err("missing file");
        assert!(err.contains("failed to open OHLCV CSV"));
    }

    #[test]
    fn parses_supported_date_formats() {
        assert_eq!(parse_date("2023-01-02").expect("plain"), date(2023, 1, 2));
        assert_eq!(
            parse_date("2023-01-02T09:15:00+05:30").expect("rfc3339"),
            date(2023, 1, 2)
        );
        assert_eq!(
            parse_date("2023-01-02 00:00:00").expect("naive"),
            date(2023, 1, 2)
        );
        assert!(parse_date("02/01/2023").is_err());
    }
}
