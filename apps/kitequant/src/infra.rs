use kitequant_application::config::{Config, DataSource};
use kitequant_domain::repositories::market_data::MarketDataRepository;
use kitequant_infrastructure::market_data::{CsvMarketDataRepository, YahooMarketDataRepository};
use std::path::{Path, PathBuf};

/// Picks the market-data adapter named by `[data].source`.
///
/// A relative `csv_path` is resolved against `config_dir`.
pub fn build_market_data_repo(
    config: &Config,
    config_dir: Option<&Path>,
) -> Result<Box<dyn MarketDataRepository>, String> {
    match config.data.source {
        DataSource::Csv => {
            let raw = config
                .data
                .csv_path
                .as_deref()
                .filter(|path| !path.trim().is_empty())
                .ok_or_else(|| "data.source = \"csv\" requires data.csv_path".to_string())?;
            let path = PathBuf::from(raw);
            let path = match config_dir {
                Some(dir) if path.is_relative() => dir.join(path),
                _ => path,
            };
            Ok(Box::new(CsvMarketDataRepository::new(path)))
        }
        DataSource::Yahoo => {
            let repo = YahooMarketDataRepository::new(
                config.data.base_url.clone(),
                config.data.timeout_ms,
            )
            .map_err(|err| format!("failed to init market data client: {err}"))?;
            Ok(Box::new(repo))
        }
    }
}
