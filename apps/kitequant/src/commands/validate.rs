use crate::infra::build_market_data_repo;
use crate::output::write_line;
use chrono::NaiveDate;
use kitequant_application::config::load_config;
use kitequant_application::validation::validate;
use std::io::Write;
use std::path::Path;

pub fn run(
    config_path: &Path,
    strict: bool,
    json: bool,
    today: NaiveDate,
    out: &mut dyn Write,
) -> Result<(), String> {
    let config = load_config(config_path)?;
    let market_data = build_market_data_repo(&config, config_path.parent())?;
    let report = validate(&config, strict, today, market_data.as_ref())?;

    if json {
        let line = serde_json::to_string(&report)
            .map_err(|err| format!("failed to serialize validation report: {err}"))?;
        return write_line(out, &line);
    }

    let count = |key: &str| {
        report
            .pointer(&format!("/source/{key}"))
            .and_then(|value| value.as_u64())
            .unwrap_or(0)
    };
    write_line(
        out,
        &format!(
            "validate: symbol={} range={}..{} rows={}",
            config.run.symbol,
            report["start"].as_str().unwrap_or("?"),
            report["end"].as_str().unwrap_or("?"),
            report["rows"]
        ),
    )?;
    write_line(
        out,
        &format!(
            "data quality: duplicates={}, out_of_order={}, invalid_close={}",
            count("duplicates"),
            count("out_of_order"),
            count("invalid_close")
        ),
    )?;
    if report["enough_for_slow_period"].as_bool() == Some(false) {
        write_line(
            out,
            "warning: fewer bars than the slow period; no trades can happen",
        )?;
    }
    if let Some(err) = report["simulation_error"].as_str() {
        write_line(out, &format!("warning: simulation would stop: {err}"))?;
    }
    Ok(())
}
