use crate::infra::build_market_data_repo;
use crate::output::{format_money, print_banner, write_line, ConsoleReportSink};
use chrono::NaiveDate;
use kitequant_application::backtesting::{run_backtest, BacktestPorts};
use kitequant_application::config::load_config_with_source;
use kitequant_application::shared::resolve_currency;
use kitequant_infrastructure::artifacts::FilesystemArtifactWriter;
use kitequant_infrastructure::chart::HtmlChartRenderer;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn run(
    config_path: &Path,
    out_dir: Option<PathBuf>,
    today: NaiveDate,
    out: &mut dyn Write,
) -> Result<(), String> {
    let (config, config_toml) = load_config_with_source(config_path)?;
    let currency = resolve_currency(&config);
    let market_data = build_market_data_repo(&config, config_path.parent())?;
    let artifacts = FilesystemArtifactWriter::new();
    let chart = HtmlChartRenderer::new();

    print_banner(out)?;
    write_line(
        out,
        &format!(
            "Starting with: {}{}",
            currency,
            format_money(config.run.initial_cash)
        ),
    )?;

    let mut sink = ConsoleReportSink::new(&mut *out, currency.clone());
    let outcome = run_backtest(
        &config,
        &config_toml,
        out_dir,
        today,
        &BacktestPorts {
            market_data: market_data.as_ref(),
            artifacts: &artifacts,
            chart: &chart,
        },
        &mut sink,
    )?;
    sink.finish()?;

    if let Some(position) = &outcome.result.open_position {
        write_line(
            out,
            &format!(
                "Still holding {:.4} shares bought on {} at {}{:.2}",
                position.size, position.entry_date, currency, position.entry_price
            ),
        )?;
    }
    if !outcome.data_quality.is_clean() {
        write_line(
            out,
            &format!(
                "Data warnings: {} duplicate, {} out-of-order, {} invalid rows",
                outcome.data_quality.duplicates,
                outcome.data_quality.out_of_order,
                outcome.data_quality.invalid_close
            ),
        )?;
    }
    write_line(out, "")?;
    write_line(out, &format!("run output: {}", outcome.run_dir.display()))?;
    if let Some(chart_path) = &outcome.chart_path {
        write_line(out, &format!("chart: {}", chart_path.display()))?;
    }
    Ok(())
}
