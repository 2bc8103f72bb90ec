use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use microfinance_core::amortization::{self, LoanTermsInput, OutstandingInput};

use crate::input;

/// Loan terms shared by the EMI, total interest and summary commands
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct LoanTermsArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (12 = 12%)
    #[arg(long, alias = "annual-rate")]
    pub rate: Option<Decimal>,

    /// Tenure in months
    #[arg(long, alias = "term")]
    pub tenure: Option<u32>,
}

/// Arguments for an outstanding principal query
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct OutstandingArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Original amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Monthly installment paid; the EMI for --tenure when omitted
    #[arg(long, alias = "emi")]
    pub installment: Option<Decimal>,

    /// Annual interest rate in percent (12 = 12%)
    #[arg(long, alias = "annual-rate")]
    pub rate: Option<Decimal>,

    /// Installments paid so far
    #[arg(long)]
    pub months_paid: Option<u32>,

    /// Tenure in months (flags months paid past the end of the loan)
    #[arg(long, alias = "term")]
    pub tenure: Option<u32>,
}

fn resolve_terms(args: LoanTermsArgs) -> Result<LoanTermsInput, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_input(path);
    }
    if args.principal.is_some() || args.rate.is_some() || args.tenure.is_some() {
        return Ok(LoanTermsInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
            tenure_months: args
                .tenure
                .ok_or("--tenure is required (or provide --input)")?,
        });
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }
    Err("--principal, --rate and --tenure (or --input <file> / stdin) required".into())
}

pub fn run_emi(args: LoanTermsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms = resolve_terms(args)?;
    let emi = microfinance_core::calculate_emi(
        terms.principal,
        terms.annual_rate_percent,
        terms.tenure_months,
    )?;
    Ok(json!({
        "principal": terms.principal,
        "annual_rate_percent": terms.annual_rate_percent,
        "tenure_months": terms.tenure_months,
        "emi": emi,
    }))
}

pub fn run_total_interest(args: LoanTermsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms = resolve_terms(args)?;
    let total_interest = microfinance_core::calculate_total_interest(
        terms.principal,
        terms.annual_rate_percent,
        terms.tenure_months,
    )?;
    Ok(json!({
        "principal": terms.principal,
        "annual_rate_percent": terms.annual_rate_percent,
        "tenure_months": terms.tenure_months,
        "total_interest": total_interest,
    }))
}

pub fn run_loan_summary(args: LoanTermsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms = resolve_terms(args)?;
    let result = amortization::analyze_loan(&terms)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_outstanding(args: OutstandingArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let query: OutstandingInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if args.principal.is_some() || args.rate.is_some() || args.months_paid.is_some() {
        let principal = args
            .principal
            .ok_or("--principal is required (or provide --input)")?;
        let annual_rate_percent = args.rate.ok_or("--rate is required (or provide --input)")?;
        let installment = match (args.installment, args.tenure) {
            (Some(installment), _) => installment,
            (None, Some(tenure)) => {
                microfinance_core::calculate_emi(principal, annual_rate_percent, tenure)?
            }
            (None, None) => return Err("--installment or --tenure is required".into()),
        };
        OutstandingInput {
            principal,
            installment,
            annual_rate_percent,
            months_paid: args
                .months_paid
                .ok_or("--months-paid is required (or provide --input)")?,
            tenure_months: args.tenure,
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file> or stdin required for outstanding principal".into());
    };

    let result = amortization::analyze_outstanding(&query)?;
    Ok(serde_json::to_value(result)?)
}
