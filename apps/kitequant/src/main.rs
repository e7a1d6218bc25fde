use clap::{Parser, Subcommand};
use kitequant::commands::{self, Command};
use kitequant::obs::{self, LogFormat};
use kitequant_application::validation::STRICT_FAILURE;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kitequant")]
#[command(
    about = "Golden-cross backtester for daily stock prices.",
    version,
    arg_required_else_help = true
)]
#[command(
    after_help = "Examples:\n  kitequant backtest --config configs/reliance.toml\n  kitequant validate --config configs/reliance.toml --strict\n  kitequant report --input runs/reliance_2023/\n"
)]
struct Cli {
    /// Log filter used when KITEQUANT_LOG is unset.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run the crossover strategy and write the run directory.
    Backtest {
        #[arg(long, env = "KITEQUANT_CONFIG")]
        config: PathBuf,
        /// Overrides `[paths].out_dir`.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Load the configured bars and report data quality.
    Validate {
        #[arg(long, env = "KITEQUANT_CONFIG")]
        config: PathBuf,
        /// Fail on duplicate, out-of-order or invalid rows.
        #[arg(long, default_value_t = false)]
        strict: bool,
        /// Print the report as one JSON line.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Re-print the trade report of a finished run.
    Report {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        currency: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = obs::init_tracing(&cli.log_level, cli.log_format) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    if let Err(err) = obs::init_metrics() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    let command = match cli.command {
        CliCommand::Backtest { config, out } => Command::Backtest { config, out },
        CliCommand::Validate {
            config,
            strict,
            json,
        } => Command::Validate {
            config,
            strict,
            json,
        },
        CliCommand::Report { input, currency } => Command::Report { input, currency },
    };

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if let Err(err) = commands::run(command, &mut handle) {
        let code = if err.contains(STRICT_FAILURE) { 2 } else { 1 };
        eprintln!("error: {err}");
        std::process::exit(code);
    }
}
