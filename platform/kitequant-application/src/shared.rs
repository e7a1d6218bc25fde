use crate::config::{Config, DataSource};
use chrono::NaiveDate;
use kitequant_domain::repositories::chart::ChartStyle;
use kitequant_domain::repositories::market_data::BarQuery;
use kitequant_domain::services::engine::simulator::SimulationParams;
use kitequant_domain::services::ohlcv::DataQualityReport;
use kitequant_domain::value_objects::bar::Bar;
use sha2::{Digest, Sha256};

pub const DEFAULT_CURRENCY: &str = "₹";

pub fn resolve_params(config: &Config) -> SimulationParams {
    let defaults = SimulationParams::default();
    let strategy = config.strategy.clone().unwrap_or_default();
    let costs = config.costs.clone().unwrap_or_default();
    SimulationParams {
        fast_period: strategy.fast_period.unwrap_or(defaults.fast_period),
        slow_period: strategy.slow_period.unwrap_or(defaults.slow_period),
        initial_cash: config.run.initial_cash,
        risk_fraction: strategy.risk_fraction.unwrap_or(defaults.risk_fraction),
        commission_rate: costs.commission_rate.unwrap_or(defaults.commission_rate),
    }
}

pub fn resolve_bar_query(config: &Config, today: NaiveDate) -> Result<BarQuery, String> {
    let end = config.run.end.unwrap_or(today);
    if end < config.run.start {
        return Err(format!(
            "run.end ({end}) must not be before run.start ({})",
            config.run.start
        ));
    }
    if config.run.symbol.trim().is_empty() {
        return Err("run.symbol must not be empty".to_string());
    }
    Ok(BarQuery {
        symbol: config.run.symbol.trim().to_string(),
        start: config.run.start,
        end,
    })
}

pub fn resolve_chart_style(config: &Config) -> ChartStyle {
    let defaults = ChartStyle::default();
    let chart = config.chart.clone().unwrap_or_default();
    let params = resolve_params(config);
    ChartStyle {
        bar_up: chart.bar_up.unwrap_or(defaults.bar_up),
        bar_down: chart.bar_down.unwrap_or(defaults.bar_down),
        bar_alpha: chart
            .bar_alpha
            .filter(|alpha| alpha.is_finite())
            .map(|alpha| alpha.clamp(0.0, 1.0))
            .unwrap_or(defaults.bar_alpha),
        fast_label: chart
            .fast_label
            .unwrap_or_else(|| format!("{}-Day Trend", params.fast_period)),
        slow_label: chart
            .slow_label
            .unwrap_or_else(|| format!("{}-Day Trend", params.slow_period)),
        explanations: chart.explanations.unwrap_or(defaults.explanations),
        ..defaults
    }
}

pub fn chart_enabled(config: &Config) -> bool {
    config
        .chart
        .as_ref()
        .and_then(|chart| chart.enabled)
        .unwrap_or(true)
}

pub fn resolve_currency(config: &Config) -> String {
    config
        .report
        .as_ref()
        .and_then(|report| report.currency.clone())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
}

pub fn config_sha256(config_toml: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(config_toml.as_bytes());
    to_hex(&hasher.finalize()[..])
}

fn to_hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}

pub fn data_quality_json(report: &DataQualityReport) -> serde_json::Value {
    serde_json::json!({
        "rows": report.rows,
        "duplicates": report.duplicates,
        "out_of_order": report.out_of_order,
        "invalid_close": report.invalid_close,
        "first_date": report.first_date,
        "last_date": report.last_date,
        "first_duplicate": report.first_duplicate,
        "first_out_of_order": report.first_out_of_order,
        "first_invalid_close": report.first_invalid_close,
    })
}

pub fn summary_meta_json(
    config: &Config,
    config_toml: &str,
    bars: &[Bar],
    data_report: &DataQualityReport,
) -> serde_json::Value {
    serde_json::json!({
        "run_id": config.run.run_id,
        "symbol": config.run.symbol,
        "start": bars.first().map(|bar| bar.date),
        "end": bars.last().map(|bar| bar.date),
        "bars": bars.len(),
        "config_sha256": config_sha256(config_toml),
        "data_quality": data_quality_json(data_report),
    })
}

pub fn config_snapshot_json(config: &Config, params: &SimulationParams) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "source": match config.data.source {
                DataSource::Csv => "csv",
                DataSource::Yahoo => "yahoo",
            },
            "csv_path": config.data.csv_path,
        },
        "strategy": {
            "fast_period": params.fast_period,
            "slow_period": params.slow_period,
            "risk_fraction": params.risk_fraction,
        },
        "costs": {
            "commission_rate": params.commission_rate,
        },
        "initial_cash": params.initial_cash,
        "chart_enabled": chart_enabled(config),
    })
}
