use crate::config::Config;
use crate::shared::{data_quality_json, resolve_bar_query, resolve_params};
use chrono::NaiveDate;
use kitequant_domain::repositories::market_data::MarketDataRepository;
use kitequant_domain::services::engine::simulator::CrossoverSimulator;
use kitequant_domain::services::ohlcv::data_quality_from_bars;
use std::time::Instant;
use tracing::info_span;

pub const STRICT_FAILURE: &str = "strict validation failed";

/// Loads the configured bars and reports their quality without writing artifacts.
///
/// In strict mode any duplicate, out-of-order or invalid row is an error, as is a
/// series the simulator would reject.
pub fn validate(
    config: &Config,
    strict: bool,
    today: NaiveDate,
    market_data: &dyn MarketDataRepository,
) -> Result<serde_json::Value, String> {
    let _span = info_span!(
        "validate",
        strict = strict,
        run_id = %config.run.run_id,
        symbol = %config.run.symbol
    )
    .entered();

    let params = resolve_params(config);
    params.validate().map_err(|err| err.to_string())?;
    let query = resolve_bar_query(config, today)?;

    let stage_start = Instant::now();
    let (bars, source_report) = market_data.load_bars(&query)?;
    metrics::histogram!("kitequant.validate.load_bars_ms")
        .record(stage_start.elapsed().as_millis() as f64);

    let loaded_report = data_quality_from_bars(&bars);
    let simulation_check = CrossoverSimulator::run(params, bars.iter().cloned())
        .err()
        .map(|err| err.to_string());

    metrics::gauge!("kitequant.validate.duplicates").set(source_report.duplicates as f64);
    metrics::gauge!("kitequant.validate.out_of_order").set(source_report.out_of_order as f64);
    metrics::gauge!("kitequant.validate.invalid_close").set(source_report.invalid_close as f64);

    if strict {
        if !source_report.is_clean() {
            return Err(format!(
                "{STRICT_FAILURE}: {} duplicate, {} out-of-order, {} invalid-close rows",
                source_report.duplicates, source_report.out_of_order, source_report.invalid_close
            ));
        }
        if let Some(err) = &simulation_check {
            return Err(format!("{STRICT_FAILURE}: {err}"));
        }
    }

    Ok(serde_json::json!({
        "symbol": query.symbol,
        "start": query.start,
        "end": query.end,
        "strict": strict,
        "rows": bars.len(),
        "enough_for_slow_period": bars.len() >= params.slow_period,
        "source": data_quality_json(&source_report),
        "loaded": data_quality_json(&loaded_report),
        "simulation_error": simulation_check,
    }))
}
