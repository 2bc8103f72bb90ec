mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::{env, process};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::loan::{LoanTermsArgs, OutstandingArgs};
use commands::portfolio::PortfolioArgs;
use commands::schedule::ScheduleArgs;

/// Microfinance loan calculations
#[derive(Parser)]
#[command(
    name = "mfin",
    version,
    about = "Microfinance loan calculations",
    long_about = "A CLI for microfinance loan arithmetic with decimal precision. \
                  Computes EMIs, total interest, outstanding principal, monthly \
                  repayment schedules and loan portfolio statistics."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Equated monthly installment for a loan
    Emi(LoanTermsArgs),
    /// Total interest payable over the tenure
    TotalInterest(LoanTermsArgs),
    /// Outstanding principal after a number of installments
    Outstanding(OutstandingArgs),
    /// EMI, total interest and total payable with assumptions and warnings
    LoanSummary(LoanTermsArgs),
    /// Month-by-month repayment schedule
    Schedule(ScheduleArgs),
    /// Portfolio statistics from a loan book and its transactions
    Portfolio(PortfolioArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

/// Log to stderr so stdout stays machine-readable.
///
/// `MFIN_LOG` takes an env-filter directive (default `warn`);
/// `MFIN_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("MFIN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let log_json = env::var("MFIN_LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Emi(args) => commands::loan::run_emi(args),
        Commands::TotalInterest(args) => commands::loan::run_total_interest(args),
        Commands::Outstanding(args) => commands::loan::run_outstanding(args),
        Commands::LoanSummary(args) => commands::loan::run_loan_summary(args),
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Portfolio(args) => commands::portfolio::run_portfolio(args),
        Commands::Version => {
            println!("mfin {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
