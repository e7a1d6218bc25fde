use kitequant_domain::repositories::artifacts::ArtifactReader;
use kitequant_domain::repositories::report_sink::ReportSink;
use kitequant_domain::services::report::{FinalReport, TradeReport};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info_span;

pub struct GenerateReportResult {
    pub input_dir: PathBuf,
    pub run_id: String,
    pub final_report: FinalReport,
}

/// Replays a finished run directory into `sink`.
pub fn generate_report(
    input_dir: &Path,
    reader: &dyn ArtifactReader,
    sink: &mut dyn ReportSink,
) -> Result<GenerateReportResult, String> {
    let _span = info_span!("generate_report", input_dir = %input_dir.display()).entered();

    let stage_start = Instant::now();
    let trades_path = input_dir.join("trades.csv");
    let summary_path = input_dir.join("summary.json");

    if !reader.exists(&trades_path) || !reader.exists(&summary_path) {
        return Err(format!(
            "missing trades.csv or summary.json in {}",
            input_dir.display()
        ));
    }

    let trades = reader.read_trades_csv(&trades_path)?;
    let summary = reader.read_summary_json(&summary_path)?;
    let final_cash = summary
        .pointer("/summary/final_cash")
        .and_then(|value| value.as_f64())
        .ok_or_else(|| format!("summary.final_cash missing in {}", summary_path.display()))?;
    let final_value = summary
        .pointer("/summary/final_value")
        .and_then(|value| value.as_f64())
        .unwrap_or(final_cash);
    let run_id = summary
        .pointer("/meta/run_id")
        .and_then(|value| value.as_str())
        .unwrap_or("unknown")
        .to_string();

    let mut profit_total = 0.0;
    for (idx, trade) in trades.iter().enumerate() {
        profit_total += trade.pnl_after_commission;
        sink.trade_closed(&TradeReport {
            trade_index: idx + 1,
            pnl_after_commission: trade.pnl_after_commission,
            is_profit: trade.is_profit(),
        });
    }
    let final_report = FinalReport {
        final_cash,
        final_value,
        profit_total,
        trade_count: trades.len(),
    };
    sink.finished(&final_report);

    metrics::histogram!("kitequant.report.generate_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    metrics::gauge!("kitequant.report.trades").set(trades.len() as f64);

    Ok(GenerateReportResult {
        input_dir: input_dir.to_path_buf(),
        run_id,
        final_report,
    })
}
