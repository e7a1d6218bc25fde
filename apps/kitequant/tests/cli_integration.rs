use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const SCENARIO_CLOSES: [f64; 10] = [10.0, 10.0, 10.0, 10.0, 11.0, 12.0, 13.0, 9.0, 8.0, 7.0];

fn unique_tmp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let dir = std::env::temp_dir().join(format!("{prefix}_{}_{nanos}", std::process::id()));
    fs::create_dir_all(&dir).expect("create tmp dir");
    dir
}

fn write_csv(dir: &Path, days: &[u32], closes: &[f64]) -> PathBuf {
    let mut csv = String::from("Date,Open,High,Low,Close,Volume\n");
    for (day, close) in days.iter().zip(closes) {
        csv.push_str(&format!(
            "2023-01-{day:02},{close},{},{},{close},1000\n",
            close + 0.5,
            close - 0.5
        ));
    }
    let path = dir.join("bars.csv");
    fs::write(&path, csv).expect("write csv");
    path
}

fn write_config(dir: &Path, run_id: &str, data_section: &str) -> PathBuf {
    let mut toml = String::new();
    toml.push_str("[run]\n");
    toml.push_str(&format!("run_id = \"{run_id}\"\n"));
    toml.push_str("symbol = \"DEMO.NS\"\n");
    toml.push_str("start = \"2023-01-01\"\n");
    toml.push_str("end = \"2023-01-31\"\n");
    toml.push_str("initial_cash = 1000.0\n\n");

    toml.push_str(data_section);
    toml.push('\n');

    toml.push_str("[strategy]\nfast_period = 2\nslow_period = 4\nrisk_fraction = 1.0\n\n");
    toml.push_str("[costs]\ncommission_rate = 0.0\n\n");

    toml.push_str("[paths]\n");
    toml.push_str(&format!("out_dir = \"{}\"\n", dir.join("runs").display()));

    let config_path = dir.join(format!("{run_id}.toml"));
    fs::write(&config_path, toml).expect("write config");
    config_path
}

fn kitequant(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kitequant"))
        .args(args)
        .env_remove("KITEQUANT_CONFIG")
        .env_remove("KITEQUANT_METRICS_ADDR")
        .env_remove("KITEQUANT_LOG")
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .env_remove("ALL_PROXY")
        .env_remove("all_proxy")
        .output()
        .expect("run kitequant")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn assert_scenario_report(stdout: &str) {
    assert!(stdout.contains("Trade 1: ₹-181.82 (Loss)"), "{stdout}");
    assert!(stdout.contains("Ending with: ₹818.18"), "{stdout}");
    assert!(
        stdout.contains("Total Profit: ₹-181.82 from 1 trades"),
        "{stdout}"
    );
}

#[test]
fn backtest_prints_report_and_writes_run_dir() {
    let dir = unique_tmp_dir("kitequant_cli_backtest");
    let days: Vec<u32> = (2..12).collect();
    write_csv(&dir, &days, &SCENARIO_CLOSES);
    let config = write_config(&dir, "scenario", "[data]\nsource = \"csv\"\ncsv_path = \"bars.csv\"\n");

    let output = kitequant(&["backtest", "--config", config.to_str().expect("utf8")]);
    let stdout = stdout_of(&output);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("---------------KITEQUANT FOR TEENS----------------"));
    assert!(stdout.contains("(Like Zerodha, but simpler!)"));
    assert!(stdout.contains("Starting with: ₹1,000.00"));
    assert_scenario_report(&stdout);

    let run_dir = dir.join("runs").join("scenario");
    for file in [
        "trades.csv",
        "equity.csv",
        "summary.json",
        "config_snapshot.toml",
        "chart.html",
    ] {
        assert!(run_dir.join(file).exists(), "missing {file}");
    }

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(run_dir.join("summary.json")).expect("read"))
            .expect("summary json");
    assert_eq!(summary["summary"]["trade_count"], 1);
    assert_eq!(summary["meta"]["run_id"], "scenario");

    let report = kitequant(&["report", "--input", run_dir.to_str().expect("utf8")]);
    assert!(report.status.success());
    let report_stdout = stdout_of(&report);
    assert_scenario_report(&report_stdout);
    assert!(report_stdout.contains("run_id: scenario"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn out_flag_overrides_configured_directory() {
    let dir = unique_tmp_dir("kitequant_cli_out");
    let days: Vec<u32> = (2..12).collect();
    write_csv(&dir, &days, &SCENARIO_CLOSES);
    let config = write_config(&dir, "override", "[data]\nsource = \"csv\"\ncsv_path = \"bars.csv\"\n");
    let out = dir.join("elsewhere");

    let output = kitequant(&[
        "backtest",
        "--config",
        config.to_str().expect("utf8"),
        "--out",
        out.to_str().expect("utf8"),
    ]);
    assert!(output.status.success());
    assert!(out.join("override").join("trades.csv").exists());
    assert!(!dir.join("runs").join("override").exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn strict_validate_exits_with_code_two_on_duplicate_dates() {
    let dir = unique_tmp_dir("kitequant_cli_strict");
    write_csv(&dir, &[2, 3, 3, 4, 5], &[10.0, 10.0, 10.0, 11.0, 12.0]);
    let config = write_config(&dir, "dupes", "[data]\nsource = \"csv\"\ncsv_path = \"bars.csv\"\n");
    let config_arg = config.to_str().expect("utf8");

    let lenient = kitequant(&["validate", "--config", config_arg, "--json"]);
    assert!(lenient.status.success());
    let report: serde_json::Value =
        serde_json::from_str(stdout_of(&lenient).trim()).expect("validation json");
    assert_eq!(report["source"]["duplicates"], 1);
    assert_eq!(report["strict"], false);

    let strict = kitequant(&["validate", "--config", config_arg, "--strict"]);
    assert_eq!(strict.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&strict.stderr).contains("strict validation failed"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn invalid_periods_fail_with_code_one() {
    let dir = unique_tmp_dir("kitequant_cli_invalid");
    let days: Vec<u32> = (2..12).collect();
    write_csv(&dir, &days, &SCENARIO_CLOSES);
    let config = write_config(&dir, "bad", "[data]\nsource = \"csv\"\ncsv_path = \"bars.csv\"\n");
    let toml = fs::read_to_string(&config)
        .expect("read config")
        .replace("fast_period = 2\nslow_period = 4", "fast_period = 50\nslow_period = 20");
    fs::write(&config, toml).expect("rewrite config");

    let output = kitequant(&["backtest", "--config", config.to_str().expect("utf8")]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid configuration"));
    assert!(!dir.join("runs").join("bad").exists());

    let _ = fs::remove_dir_all(&dir);
}

struct MockChartServer {
    base_url: String,
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl MockChartServer {
    fn start(body: String) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{}", addr);
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = stop.clone();

        let handle = thread::spawn(move || {
            listener.set_nonblocking(true).expect("nonblocking");
            while !stop_clone.load(Ordering::Relaxed) {
                match listener.accept() {
                    Ok((mut stream, _)) => {
                        let _ = handle_connection(&mut stream, &body);
                    }
                    Err(_) => thread::sleep(Duration::from_millis(10)),
                }
            }
        });

        Self {
            base_url,
            stop,
            handle: Some(handle),
        }
    }
}

impl Drop for MockChartServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn handle_connection(stream: &mut TcpStream, body: &str) -> Result<(), String> {
    stream.set_nonblocking(false).map_err(|e| e.to_string())?;
    stream
        .set_read_timeout(Some(Duration::from_secs(2)))
        .map_err(|e| e.to_string())?;

    let mut buf = Vec::new();
    let mut tmp = [0u8; 1024];
    loop {
        let n = stream.read(&mut tmp).map_err(|e| e.to_string())?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&tmp[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.len() > 8192 {
            break;
        }
    }

    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream
        .write_all(header.as_bytes())
        .map_err(|e| e.to_string())?;
    stream.write_all(body.as_bytes()).map_err(|e| e.to_string())
}

// Daily sessions opening 09:15 IST from 2023-01-02.
fn chart_payload(closes: &[f64]) -> String {
    let timestamps: Vec<String> = (0..closes.len())
        .map(|idx| (1_672_631_100 + idx as i64 * 86_400).to_string())
        .collect();
    let series: Vec<String> = closes.iter().map(|close| format!("{close:.1}")).collect();
    let series = series.join(",");
    format!(
        r#"{{"chart":{{"result":[{{"meta":{{"symbol":"DEMO.NS","gmtoffset":19800}},"timestamp":[{}],"indicators":{{"quote":[{{"open":[{series}],"high":[{series}],"low":[{series}],"close":[{series}],"volume":[{series}]}}]}}}}],"error":null}}}}"#,
        timestamps.join(",")
    )
}

#[test]
fn backtest_reads_bars_from_chart_api() {
    let server = MockChartServer::start(chart_payload(&SCENARIO_CLOSES));
    let dir = unique_tmp_dir("kitequant_cli_yahoo");
    let data = format!(
        "[data]\nsource = \"yahoo\"\nbase_url = \"{}\"\ntimeout_ms = 2000\n",
        server.base_url
    );
    let config = write_config(&dir, "remote", &data);

    let output = kitequant(&["backtest", "--config", config.to_str().expect("utf8")]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_scenario_report(&stdout_of(&output));

    let _ = fs::remove_dir_all(&dir);
}
