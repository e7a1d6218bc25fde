use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Csv,
    Yahoo,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub run: RunConfig,
    pub data: DataConfig,
    pub paths: PathsConfig,
    pub strategy: Option<StrategyConfig>,
    pub costs: Option<CostsConfig>,
    pub chart: Option<ChartConfig>,
    pub report: Option<ReportConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub run_id: String,
    pub symbol: String,
    pub start: NaiveDate,
    /// Inclusive; today when omitted.
    pub end: Option<NaiveDate>,
    pub initial_cash: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    pub source: DataSource,
    pub csv_path: Option<String>,
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    pub out_dir: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct StrategyConfig {
    pub fast_period: Option<usize>,
    pub slow_period: Option<usize>,
    pub risk_fraction: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct CostsConfig {
    pub commission_rate: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ChartConfig {
    pub enabled: Option<bool>,
    pub explanations: Option<bool>,
    pub bar_up: Option<String>,
    pub bar_down: Option<String>,
    pub bar_alpha: Option<f64>,
    pub fast_label: Option<String>,
    pub slow_label: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    pub currency: Option<String>,
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    let (config, _source) = load_config_with_source(path)?;
    Ok(config)
}

pub fn load_config_with_source(path: &Path) -> Result<(Config, String), String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    let config = parse_config(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))?;
    Ok((config, contents))
}

pub fn parse_config(contents: &str) -> Result<Config, String> {
    toml::from_str(contents).map_err(|err| err.to_string())
}

pub fn to_toml_pretty(config: &Config) -> Result<String, String> {
    toml::to_string_pretty(config)
        .map_err(|err| format!("failed to serialize config as TOML: {err}"))
}

#[cfg(test)]
mod tests {
    use super::{parse_config, to_toml_pretty, Config, DataSource};
    use chrono::NaiveDate;

    const MINIMAL: &str = r#"
[run]
run_id = "reliance_2023"
symbol = "RELIANCE.NS"
start = "2023-01-01"
initial_cash = 50000.0

[data]
source = "yahoo"

[paths]
out_dir = "runs/"
"#;

    #[test]
    fn parse_config_rejects_malformed_toml() {
        let err = parse_config("[run\nrun_id = 1").expect_err("malformed");
        assert!(!err.is_empty());
    }

    #[test]
    fn parse_config_rejects_unknown_fields() {
        let toml_str = format!("{MINIMAL}\nunknown_field = 123\n");
        let err = parse_config(&toml_str).expect_err("unknown field should fail");
        assert!(err.to_lowercase().contains("unknown field"));
    }

    #[test]
    fn parse_minimal_config() {
        let config: Config = parse_config(MINIMAL).expect("config should parse");
        assert_eq!(config.run.symbol, "RELIANCE.NS");
        assert_eq!(
            config.run.start,
            NaiveDate::from_ymd_opt(2023, 1, 1).expect("date")
        );
        assert!(config.run.end.is_none());
        assert_eq!(config.data.source, DataSource::Yahoo);
        assert!(config.strategy.is_none());
        assert!(config.chart.is_none());
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[run]
run_id = "csv_run"
symbol = "DEMO"
start = "2023-01-01"
end = "2023-12-31"
initial_cash = 1000.0

[data]
source = "csv"
csv_path = "data/demo.csv"

[strategy]
fast_period = 5
slow_period = 15
risk_fraction = 0.5

[costs]
commission_rate = 0.002

[paths]
out_dir = "runs/"

[chart]
enabled = false
explanations = false
bar_alpha = 0.4

[report]
currency = "$"
"#;
        let config = parse_config(toml_str).expect("config should parse");
        assert_eq!(config.data.source, DataSource::Csv);
        assert_eq!(config.data.csv_path.as_deref(), Some("data/demo.csv"));
        let strategy = config.strategy.as_ref().expect("strategy");
        assert_eq!(strategy.fast_period, Some(5));
        assert_eq!(strategy.slow_period, Some(15));
        assert_eq!(
            config.costs.as_ref().and_then(|c| c.commission_rate),
            Some(0.002)
        );
        assert_eq!(
            config.report.as_ref().and_then(|r| r.currency.as_deref()),
            Some("$")
        );
    }

    #[test]
    fn parse_config_rejects_unknown_source() {
        let toml_str = MINIMAL.replace("\"yahoo\"", "\"postgres\"");
        assert!(parse_config(&toml_str).is_err());
    }

    #[test]
    fn pretty_toml_parses_back() {
        let config = parse_config(MINIMAL).expect("config should parse");
        let rendered = to_toml_pretty(&config).expect("serialize");
        let reparsed = parse_config(&rendered).expect("reparse");
        assert_eq!(reparsed.run.run_id, config.run.run_id);
        assert_eq!(reparsed.run.start, config.run.start);
    }

    #[test]
    fn bundled_reliance_config_parses() {
        let config = parse_config(include_str!("../../../../configs/reliance.toml"))
            .expect("bundled config should parse");
        assert_eq!(config.run.symbol, "RELIANCE.NS");
        assert!(config.run.end.is_none());
        assert!(matches!(config.data.source, DataSource::Yahoo));
    }
}
