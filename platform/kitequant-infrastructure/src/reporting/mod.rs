use chrono::NaiveDate;
use kitequant_domain::services::report::RunSummary;
use kitequant_domain::value_objects::equity_point::EquityPoint;
use kitequant_domain::value_objects::trade::Trade;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::Path;

pub fn write_trades_csv(path: &Path, trades: &[Trade]) -> Result<(), String> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create trades csv {}: {}", path.display(), err))?;
    wtr.write_record([
        "trade_index",
        "entry_date",
        "exit_date",
        "entry_price",
        "exit_price",
        "size",
        "pnl_after_commission",
        "is_profit",
    ])
    .map_err(|err| format!("failed to write trades csv header: {}", err))?;

    for (idx, trade) in trades.iter().enumerate() {
        wtr.write_record([
            (idx + 1).to_string(),
            trade.entry_date.to_string(),
            trade.exit_date.to_string(),
            trade.entry_price.to_string(),
            trade.exit_price.to_string(),
            trade.size.to_string(),
            trade.pnl_after_commission.to_string(),
            trade.is_profit().to_string(),
        ])
        .map_err(|err| format!("failed to write trades row: {}", err))?;
    }

    wtr.flush()
        .map_err(|err| format!("failed to flush trades csv: {}", err))
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn write_equity_csv(path: &Path, points: &[EquityPoint]) -> Result<(), String> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create equity csv {}: {}", path.display(), err))?;
    wtr.write_record([
        "date",
        "close",
        "fast_sma",
        "slow_sma",
        "cash",
        "position_size",
        "equity",
    ])
    .map_err(|err| format!("failed to write equity csv header: {}", err))?;

    for point in points {
        wtr.write_record([
            point.date.to_string(),
            point.close.to_string(),
            optional(point.fast_sma),
            optional(point.slow_sma),
            point.cash.to_string(),
            point.position_size.to_string(),
            point.equity.to_string(),
        ])
        .map_err(|err| format!("failed to write equity row: {}", err))?;
    }

    wtr.flush()
        .map_err(|err| format!("failed to flush equity csv: {}", err))
}

pub fn write_summary_json(
    path: &Path,
    summary: &RunSummary,
    meta: Option<&serde_json::Value>,
    config_snapshot: Option<&serde_json::Value>,
) -> Result<(), String> {
    let json = serde_json::json!({
        "meta": meta,
        "config_snapshot": config_snapshot,
        "summary": summary,
    });
    let json = serde_json::to_string_pretty(&json)
        .map_err(|err| format!("failed to serialize summary: {}", err))?;
    let mut file =
        fs::File::create(path).map_err(|err| format!("failed to create summary: {}", err))?;
    file.write_all(json.as_bytes())
        .map_err(|err| format!("failed to write summary: {}", err))
}

pub fn read_summary_json(path: &Path) -> Result<serde_json::Value, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("failed to read summary {}: {}", path.display(), err))?;
    serde_json::from_str(&raw)
        .map_err(|err| format!("failed to parse summary {}: {}", path.display(), err))
}

#[derive(Debug, Clone, Deserialize)]
struct TradeRecord {
    trade_index: usize,
    entry_date: NaiveDate,
    exit_date: NaiveDate,
    entry_price: f64,
    exit_price: f64,
    size: f64,
    pnl_after_commission: f64,
}

/// Reads `trades.csv` back in `trade_index` order.
pub fn read_trades_csv(path: &Path) -> Result<Vec<Trade>, String> {
    let mut rdr = csv::Reader::from_path(path)
        .map_err(|err| format!("failed to open trades csv {}: {}", path.display(), err))?;
    let mut records = Vec::new();
    for result in rdr.deserialize::<TradeRecord>() {
        records.push(result.map_err(|err| format!("failed to parse trade record: {}", err))?);
    }
    records.sort_by_key(|record| record.trade_index);
    Ok(records
        .into_iter()
        .map(|record| Trade {
            entry_date: record.entry_date,
            exit_date: record.exit_date,
            entry_price: record.entry_price,
            exit_price: record.exit_price,
            size: record.size,
            pnl_after_commission: record.pnl_after_commission,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{read_summary_json, read_trades_csv, write_equity_csv, write_summary_json, write_trades_csv};
    use chrono::NaiveDate;
    use kitequant_domain::services::report::RunSummary;
    use kitequant_domain::value_objects::equity_point::EquityPoint;
    use kitequant_domain::value_objects::trade::Trade;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_tmp_dir(prefix: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("kitequant_{prefix}_{}_{}", std::process::id(), now))
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).expect("date")
    }

    fn trade(exit_day: u32, pnl: f64) -> Trade {
        Trade {
            entry_date: date(exit_day - 1),
            exit_date: date(exit_day),
            entry_price: 11.0,
            exit_price: 9.0,
            size: 1000.0 / 11.0,
            pnl_after_commission: pnl,
        }
    }

    #[test]
    fn trades_csv_reads_back_in_index_order() {
        let dir = unique_tmp_dir("report_trades");
        fs::create_dir_all(&dir).expect("dir");
        let path = dir.join("trades.csv");
        let trades = vec![trade(5, -181.8181818181818), trade(9, 0.0)];

        write_trades_csv(&path, &trades).expect("write trades");
        let raw = fs::read_to_string(&path).expect("read raw");
        assert!(raw.starts_with("trade_index,entry_date,exit_date,"));
        assert!(raw.contains("1,2023-01-04,2023-01-05,11,9,"));
        assert!(raw.contains(",false\n"));
        assert!(raw.contains(",true\n"));

        let parsed = read_trades_csv(&path).expect("read trades");
        assert_eq!(parsed, trades);
    }

    #[test]
    fn equity_csv_leaves_undefined_averages_empty() {
        let dir = unique_tmp_dir("report_equity");
        fs::create_dir_all(&dir).expect("dir");
        let path = dir.join("equity.csv");
        let points = vec![EquityPoint {
            date: date(2),
            close: 10.0,
            fast_sma: Some(10.0),
            slow_sma: None,
            cash: 1000.0,
            position_size: 0.0,
            equity: 1000.0,
        }];

        write_equity_csv(&path, &points).expect("write equity");
        let raw = fs::read_to_string(&path).expect("read raw");
        assert_eq!(
            raw,
            "date,close,fast_sma,slow_sma,cash,position_size,equity\n2023-01-02,10,10,,1000,0,1000\n"
        );
    }

    #[test]
    fn summary_json_nests_summary_meta_and_snapshot() {
        let dir = unique_tmp_dir("report_summary");
        fs::create_dir_all(&dir).expect("dir");
        let path = dir.join("summary.json");
        let summary = RunSummary {
            initial_cash: 1000.0,
            final_cash: 818.0,
            final_value: 818.0,
            profit_total: -182.0,
            trade_count: 1,
            win_rate: 0.0,
            max_drawdown: 0.18,
            bars_processed: 10,
            open_position: None,
        };
        let meta = serde_json::json!({ "run_id": "r1" });

        write_summary_json(&path, &summary, Some(&meta), None).expect("write summary");
        let json = read_summary_json(&path).expect("read summary");
        assert_eq!(json["summary"]["final_cash"], 818.0);
        assert_eq!(json["summary"]["trade_count"], 1);
        assert_eq!(json["meta"]["run_id"], "r1");
        assert!(json["config_snapshot"].is_null());
        assert!(json["summary"]["open_position"].is_null());
    }
}
