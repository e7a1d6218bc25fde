use crate::config::Config;
use crate::shared::{
    chart_enabled, config_snapshot_json, resolve_bar_query, resolve_chart_style, resolve_params,
    summary_meta_json,
};
use chrono::NaiveDate;
use kitequant_domain::repositories::artifacts::ArtifactWriter;
use kitequant_domain::repositories::chart::{ChartInput, ChartRenderer};
use kitequant_domain::repositories::market_data::MarketDataRepository;
use kitequant_domain::repositories::report_sink::ReportSink;
use kitequant_domain::services::engine::simulator::{
    CrossoverSimulator, SimulationParams, SimulationResult, TradeEvent,
};
use kitequant_domain::services::ohlcv::DataQualityReport;
use kitequant_domain::services::report::{emit_report, run_summary};
use kitequant_domain::value_objects::bar::Bar;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, info_span, warn};

#[derive(Debug)]
pub struct BacktestOutcome {
    pub run_dir: PathBuf,
    pub result: SimulationResult,
    pub data_quality: DataQualityReport,
    pub chart_path: Option<PathBuf>,
}

pub struct BacktestPorts<'a> {
    pub market_data: &'a dyn MarketDataRepository,
    pub artifacts: &'a dyn ArtifactWriter,
    pub chart: &'a dyn ChartRenderer,
}

pub fn run_backtest(
    config: &Config,
    config_toml: &str,
    out: Option<PathBuf>,
    today: NaiveDate,
    ports: &BacktestPorts<'_>,
    sink: &mut dyn ReportSink,
) -> Result<BacktestOutcome, String> {
    let _span = info_span!(
        "run_backtest",
        run_id = %config.run.run_id,
        symbol = %config.run.symbol
    )
    .entered();

    let params = resolve_params(config);
    params.validate().map_err(|err| err.to_string())?;
    let query = resolve_bar_query(config, today)?;

    let stage_start = Instant::now();
    let (bars, data_report) = ports.market_data.load_bars(&query)?;
    metrics::histogram!("kitequant.backtest.load_bars_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    info!(
        rows = bars.len(),
        start = %query.start,
        end = %query.end,
        "loaded bars"
    );
    if !data_report.is_clean() {
        warn!(
            duplicates = data_report.duplicates,
            out_of_order = data_report.out_of_order,
            invalid_close = data_report.invalid_close,
            "market data has quality issues"
        );
    }
    if bars.len() < params.slow_period {
        warn!(
            rows = bars.len(),
            slow_period = params.slow_period,
            "fewer bars than the slow period; no crossover can occur"
        );
    }

    let stage_start = Instant::now();
    let result = simulate(params, &bars)?;
    let engine_ms = stage_start.elapsed().as_millis() as f64;
    metrics::histogram!("kitequant.backtest.engine_ms").record(engine_ms);
    metrics::gauge!("kitequant.backtest.bars_processed")
        .set(result.summary.bars_processed as f64);
    metrics::gauge!("kitequant.backtest.trades").set(result.summary.trade_count as f64);

    emit_report(&result, sink);

    let run_dir = out
        .unwrap_or_else(|| PathBuf::from(&config.paths.out_dir))
        .join(&config.run.run_id);
    let chart_path = write_outputs(
        config,
        config_toml,
        &run_dir,
        &bars,
        &data_report,
        &result,
        ports,
    )?;

    Ok(BacktestOutcome {
        run_dir,
        result,
        data_quality: data_report,
        chart_path,
    })
}

fn simulate(params: SimulationParams, bars: &[Bar]) -> Result<SimulationResult, String> {
    let mut simulator = CrossoverSimulator::new(params).map_err(|err| err.to_string())?;
    for bar in bars {
        match simulator.on_bar(bar).map_err(|err| err.to_string())? {
            Some(TradeEvent::Opened { bar_index, position }) => debug!(
                bar_index,
                date = %position.entry_date,
                price = position.entry_price,
                size = position.size,
                "opened long"
            ),
            Some(TradeEvent::Closed {
                bar_index,
                trade_index,
                trade,
            }) => debug!(
                bar_index,
                trade_index,
                date = %trade.exit_date,
                pnl = trade.pnl_after_commission,
                "closed long"
            ),
            None => {}
        }
    }
    Ok(simulator.finish())
}

fn write_outputs(
    config: &Config,
    config_toml: &str,
    run_dir: &Path,
    bars: &[Bar],
    data_report: &DataQualityReport,
    result: &SimulationResult,
    ports: &BacktestPorts<'_>,
) -> Result<Option<PathBuf>, String> {
    let artifacts = ports.artifacts;
    artifacts.ensure_dir(run_dir)?;

    artifacts.write_trades_csv(run_dir.join("trades.csv").as_path(), &result.trades)?;
    artifacts.write_equity_csv(run_dir.join("equity.csv").as_path(), &result.equity)?;
    let meta = summary_meta_json(config, config_toml, bars, data_report);
    let config_snapshot = config_snapshot_json(config, &result.params);
    artifacts.write_summary_json(
        run_dir.join("summary.json").as_path(),
        &run_summary(result),
        Some(&meta),
        Some(&config_snapshot),
    )?;
    artifacts
        .write_config_snapshot_toml(run_dir.join("config_snapshot.toml").as_path(), config_toml)?;

    if !chart_enabled(config) {
        return Ok(None);
    }
    let chart_path = run_dir.join("chart.html");
    let title = format!("{} Golden Cross", config.run.symbol);
    let stage_start = Instant::now();
    ports.chart.render(
        &chart_path,
        &ChartInput {
            title: &title,
            symbol: &config.run.symbol,
            bars,
            result,
        },
        &resolve_chart_style(config),
    )?;
    metrics::histogram!("kitequant.backtest.chart_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    Ok(Some(chart_path))
}
