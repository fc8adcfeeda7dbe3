mod commands;
mod grunnlag;
mod library;
mod render;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use regel_engine::RegelPeriode;
use time::Date;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `REGEL_LOG=regel_engine=trace`.
const LOG_ENV: &str = "REGEL_LOG";

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Periodized rule runs with explanations.
#[derive(Parser)]
#[command(name = "regel", version, about = "Periodized rule runs with explanations")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct PeriodArgs {
    /// Path to the grunnlag JSON file
    grunnlag: PathBuf,
    /// First day of the period (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    from: Date,
    /// Day after the last day of the period; omit for an open-ended period
    #[arg(long, value_parser = parse_date)]
    to: Option<Date>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reconciliation rules over a period
    Run {
        #[command(flatten)]
        args: PeriodArgs,
    },

    /// Run and print the full explanation of every sub-period
    Explain {
        #[command(flatten)]
        args: PeriodArgs,
    },

    /// List the rules in the reconciliation library
    Rules,
}

fn parse_date(s: &str) -> Result<Date, String> {
    grunnlag::parse_date(s).map_err(|e| e.to_string())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("warning: logging disabled: {}", e);
    }
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let output = cli.output;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Run { args } => {
            let period = query_period(&args, output, quiet);
            commands::run::cmd_run(&args.grunnlag, period, false, output, quiet);
        }
        Commands::Explain { args } => {
            let period = query_period(&args, output, quiet);
            commands::run::cmd_run(&args.grunnlag, period, true, output, quiet);
        }
        Commands::Rules => commands::rules::cmd_rules(output, quiet),
    }
}

fn query_period(args: &PeriodArgs, output: OutputFormat, quiet: bool) -> RegelPeriode {
    match RegelPeriode::new(args.from, args.to) {
        Ok(p) => p,
        Err(e) => {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    }
}

/// Report an error in the appropriate output format.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => eprintln!("{}", serde_json::json!({ "error": msg })),
    }
}
