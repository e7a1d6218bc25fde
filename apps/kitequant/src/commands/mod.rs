use chrono::NaiveDate;
use std::io::Write;
use std::path::PathBuf;

pub mod backtest;
pub mod report;
pub mod validate;

pub enum Command {
    Backtest {
        config: PathBuf,
        out: Option<PathBuf>,
    },
    Validate {
        config: PathBuf,
        strict: bool,
        json: bool,
    },
    Report {
        input: PathBuf,
        currency: Option<String>,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Backtest { .. } => "backtest",
            Command::Validate { .. } => "validate",
            Command::Report { .. } => "report",
        }
    }
}

pub fn run(command: Command, out: &mut dyn Write) -> Result<(), String> {
    let name = command.name();
    let result = match command {
        Command::Backtest { config, out: out_dir } => {
            backtest::run(&config, out_dir, today(), out)
        }
        Command::Validate {
            config,
            strict,
            json,
        } => validate::run(&config, strict, json, today(), out),
        Command::Report { input, currency } => report::run(&input, currency.as_deref(), out),
    };
    let status = if result.is_ok() { "ok" } else { "error" };
    metrics::counter!("kitequant.cli.commands_total", "command" => name, "result" => status)
        .increment(1);
    result
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
