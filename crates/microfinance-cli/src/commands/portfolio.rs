use clap::Args;
use serde_json::Value;

use microfinance_core::portfolio::{self, PortfolioInput};

use crate::input;

/// Arguments for the portfolio report
#[derive(Args)]
pub struct PortfolioArgs {
    /// Path to JSON/YAML file with `loans`, `transactions` and optional `customers`
    #[arg(long)]
    pub input: Option<String>,

    /// Number of top customers to list
    #[arg(long)]
    pub top: Option<usize>,
}

pub fn run_portfolio(args: PortfolioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut book: PortfolioInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file> or stdin required for the portfolio report".into());
    };
    if args.top.is_some() {
        book.top_customers = args.top;
    }

    let result = portfolio::generate_portfolio_report(&book)?;
    Ok(serde_json::to_value(result)?)
}
