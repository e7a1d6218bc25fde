use super::{collect_bars, RawRow};
use chrono::{DateTime, Days, NaiveDate};
use kitequant_domain::repositories::market_data::{BarQuery, MarketDataRepository};
use kitequant_domain::services::ohlcv::DataQualityReport;
use kitequant_domain::value_objects::bar::Bar;
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info_span};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Daily bars from the Yahoo Finance chart endpoint.
pub struct YahooMarketDataRepository {
    base_url: String,
    client: Client,
}

impl YahooMarketDataRepository {
    pub fn new(base_url: Option<String>, timeout_ms: Option<u64>) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_millis(
                timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
            ))
            .user_agent(concat!("kitequant/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;
        Ok(Self {
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client,
        })
    }

    pub fn chart_url(&self, query: &BarQuery) -> Result<Url, String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| format!("invalid market data base url {}: {err}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| format!("market data base url cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", query.symbol.as_str()]);
        let (period1, period2) = period_bounds(query);
        url.query_pairs_mut()
            .append_pair("period1", &period1.to_string())
            .append_pair("period2", &period2.to_string())
            .append_pair("interval", "1d")
            .append_pair("events", "history");
        Ok(url)
    }

    fn fetch(&self, query: &BarQuery) -> Result<String, String> {
        let url = self.chart_url(query)?;
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| format!("market data request failed for {}: {err}", query.symbol))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|err| format!("failed to read market data response: {err}"))?;
        if status == StatusCode::OK || status == StatusCode::NOT_FOUND {
            // Unknown symbols come back as 404 with a chart.error payload.
            return Ok(body);
        }
        Err(format!(
            "market data http error for {}: status {}",
            query.symbol,
            status.as_u16()
        ))
    }
}

impl MarketDataRepository for YahooMarketDataRepository {
    fn load_bars(&self, query: &BarQuery) -> Result<(Vec<Bar>, DataQualityReport), String> {
        let _span = info_span!("yahoo_load_bars", symbol = %query.symbol).entered();
        let start = Instant::now();
        let result = self
            .fetch(query)
            .and_then(|body| parse_chart_response(&body, query));
        let result_label = if result.is_ok() { "ok" } else { "err" };
        metrics::histogram!(
            "kitequant.infra.market_data.load_ms",
            "source" => "yahoo",
            "result" => result_label
        )
        .record(start.elapsed().as_millis() as f64);
        if let Ok((bars, _)) = &result {
            debug!(rows = bars.len(), "downloaded bars");
        }
        result
    }
}

/// Unix seconds for the start of `start` and the start of the day after `end`.
fn period_bounds(query: &BarQuery) -> (i64, i64) {
    let midnight = |date: NaiveDate| {
        date.and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0)
    };
    let after_end = query
        .end
        .checked_add_days(Days::new(1))
        .unwrap_or(query.end);
    (midnight(query.start), midnight(after_end))
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Parses a chart API payload into bars for `query`.
///
/// Timestamps are shifted by the exchange `gmtoffset` before taking the calendar
/// date. Rows whose prices are all null (holidays, halted days) are skipped.
pub fn parse_chart_response(
    body: &str,
    query: &BarQuery,
) -> Result<(Vec<Bar>, DataQualityReport), String> {
    let envelope: ChartEnvelope = serde_json::from_str(body)
        .map_err(|err| format!("failed to parse chart response: {err}"))?;

    if let Some(error) = envelope.chart.error {
        return Err(format!(
            "chart api error for {}: {} ({})",
            query.symbol,
            error.description.unwrap_or_else(|| "unknown error".to_string()),
            error.code.unwrap_or_else(|| "no code".to_string())
        ));
    }

    let result = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| format!("chart api returned no result for {}", query.symbol))?;
    let offset = result.meta.and_then(|meta| meta.gmtoffset).unwrap_or(0);
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let at = |series: &[Option<f64>], idx: usize| series.get(idx).copied().flatten();

    let mut rows = Vec::with_capacity(result.timestamp.len());
    for (idx, ts) in result.timestamp.iter().enumerate() {
        let date = ts
            .checked_add(offset)
            .and_then(|local| DateTime::from_timestamp(local, 0))
            .ok_or_else(|| format!("chart api returned invalid timestamp {ts}"))?
            .date_naive();
        let (open, high, low, close) = (
            at(&quote.open, idx),
            at(&quote.high, idx),
            at(&quote.low, idx),
            at(&quote.close, idx),
        );
        if open.is_none() && high.is_none() && low.is_none() && close.is_none() {
            continue;
        }
        rows.push(RawRow {
            date,
            open,
            high,
            low,
            close,
            volume: at(&quote.volume, idx),
        });
    }

    Ok(collect_bars(rows, query))
}
