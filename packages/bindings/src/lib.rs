use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use microfinance_core::amortization::{LoanTermsInput, OutstandingInput};
use microfinance_core::portfolio::PortfolioInput;
use microfinance_core::schedule::ScheduleInput;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

#[derive(Serialize)]
struct Amount {
    value: Decimal,
}

#[derive(Deserialize)]
struct OutstandingQuery {
    principal: Decimal,
    installment: Decimal,
    annual_rate_percent: Decimal,
    months_paid: u32,
}

// ---------------------------------------------------------------------------
// Amortization engine
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_emi(input_json: String) -> NapiResult<String> {
    let input: LoanTermsInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let value = microfinance_core::calculate_emi(
        input.principal,
        input.annual_rate_percent,
        input.tenure_months,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&Amount { value }).map_err(to_napi_error)
}

#[napi]
pub fn calculate_total_interest(input_json: String) -> NapiResult<String> {
    let input: LoanTermsInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let value = microfinance_core::calculate_total_interest(
        input.principal,
        input.annual_rate_percent,
        input.tenure_months,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&Amount { value }).map_err(to_napi_error)
}

#[napi]
pub fn calculate_outstanding_principal(input_json: String) -> NapiResult<String> {
    let input: OutstandingQuery = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let value = microfinance_core::calculate_outstanding_principal(
        input.principal,
        input.installment,
        input.annual_rate_percent,
        input.months_paid,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&Amount { value }).map_err(to_napi_error)
}

#[napi]
pub fn analyze_loan(input_json: String) -> NapiResult<String> {
    let input: LoanTermsInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        microfinance_core::amortization::analyze_loan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyze_outstanding(input_json: String) -> NapiResult<String> {
    let input: OutstandingInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        microfinance_core::amortization::analyze_outstanding(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Schedules and reporting
// ---------------------------------------------------------------------------

#[napi]
pub fn build_repayment_schedule(input_json: String) -> NapiResult<String> {
    let input: ScheduleInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = microfinance_core::schedule::build_repayment_schedule(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn generate_portfolio_report(input_json: String) -> NapiResult<String> {
    let input: PortfolioInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = microfinance_core::portfolio::generate_portfolio_report(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
