use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use microfinance_core::schedule::{self, ScheduleInput};

use crate::input;

/// Arguments for a repayment schedule
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ScheduleArgs {
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

    /// Fixed installment to schedule instead of the EMI
    #[arg(long)]
    pub installment: Option<Decimal>,

    /// Disbursement date (YYYY-MM-DD); adds due dates to each period
    #[arg(long)]
    pub disbursement_date: Option<NaiveDate>,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: ScheduleInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if args.principal.is_some() || args.rate.is_some() || args.tenure.is_some() {
        ScheduleInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
            tenure_months: args
                .tenure
                .ok_or("--tenure is required (or provide --input)")?,
            installment: args.installment,
            disbursement_date: args.disbursement_date,
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file> or stdin required for a repayment schedule".into());
    };

    let result = schedule::build_repayment_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}
