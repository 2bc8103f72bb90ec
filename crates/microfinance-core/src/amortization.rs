//! Loan amortization engine.
//!
//! Covers:
//! 1. **EMI** -- the equated monthly installment that fully amortizes a loan.
//! 2. **Total interest** -- EMI x tenure less principal.
//! 3. **Outstanding principal** -- balance left after a number of payments of
//!    a given installment.
//!
//! Annual rates are quoted as percentages (12 = 12% p.a.) and converted to a
//! monthly rate as `annual / 12 / 100`. Every currency result is rounded to
//! 2 dp with [`round_currency`]. A zero rate takes the straight-line branch
//! instead of the annuity formula, which is 0/0 there.

use rust_decimal::prelude::*;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::MicrofinanceError;
use crate::types::*;
use crate::MicrofinanceResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);
const PERCENT: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Round a currency amount to 2 dp, half away from zero (4442.435 -> 4442.44).
pub fn round_currency(amount: Money) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Monthly periodic rate for an annual percentage rate (12 -> 0.01).
pub fn monthly_rate(annual_rate_percent: Percent) -> Rate {
    annual_rate_percent / MONTHS_PER_YEAR / PERCENT
}

/// Equated monthly installment for a fully amortizing loan.
///
/// `installment = P * r * (1 + r)^n / ((1 + r)^n - 1)`, or `P / n` when the
/// monthly rate is zero.
pub fn calculate_emi(
    principal: Money,
    annual_rate_percent: Percent,
    tenure_months: Months,
) -> MicrofinanceResult<Money> {
    validate_principal(principal)?;
    validate_rate(annual_rate_percent)?;
    validate_tenure(tenure_months)?;

    let rate = monthly_rate(annual_rate_percent);
    let emi = if rate.is_zero() {
        round_currency(principal / Decimal::from(tenure_months))
    } else {
        let factor = growth_factor(rate, tenure_months, "EMI")?;
        let denominator = factor - Decimal::ONE;
        if denominator.is_zero() {
            return Err(MicrofinanceError::DivisionByZero {
                context: "EMI annuity denominator".into(),
            });
        }
        let numerator = principal
            .checked_mul(rate)
            .and_then(|v| v.checked_mul(factor))
            .ok_or_else(|| overflow("EMI numerator"))?;
        let installment = numerator
            .checked_div(denominator)
            .ok_or_else(|| overflow("EMI"))?;
        round_currency(installment)
    };

    debug!(%principal, %annual_rate_percent, tenure_months, %emi, "computed EMI");
    Ok(emi)
}

/// Total interest payable over the tenure: `EMI * n - P`.
///
/// Built on the rounded EMI, so the rounding error of the installment is
/// carried `n` times.
pub fn calculate_total_interest(
    principal: Money,
    annual_rate_percent: Percent,
    tenure_months: Months,
) -> MicrofinanceResult<Money> {
    let emi = calculate_emi(principal, annual_rate_percent, tenure_months)?;
    let total_paid = emi
        .checked_mul(Decimal::from(tenure_months))
        .ok_or_else(|| overflow("total interest"))?;
    Ok(total_paid - principal)
}

/// Outstanding principal after `months_paid` payments of `installment`.
///
/// `B = P * (1 + r)^k - A * ((1 + r)^k - 1) / r`, or `P - A * k` at a zero
/// rate. The balance is floored at zero before rounding. Neither
/// `months_paid <= tenure` nor the installment matching [`calculate_emi`] is
/// checked.
pub fn calculate_outstanding_principal(
    principal: Money,
    installment: Money,
    annual_rate_percent: Percent,
    months_paid: Months,
) -> MicrofinanceResult<Money> {
    let raw = raw_outstanding(principal, installment, annual_rate_percent, months_paid)?;
    Ok(round_currency(raw.max(Decimal::ZERO)))
}

/// Unclamped, unrounded balance; negative once payments exceed the debt.
fn raw_outstanding(
    principal: Money,
    installment: Money,
    annual_rate_percent: Percent,
    months_paid: Months,
) -> MicrofinanceResult<Money> {
    validate_principal(principal)?;
    validate_rate(annual_rate_percent)?;
    if installment < Decimal::ZERO {
        return Err(MicrofinanceError::invalid(
            "installment",
            "Installment cannot be negative",
        ));
    }

    let rate = monthly_rate(annual_rate_percent);
    if rate.is_zero() {
        let paid = installment
            .checked_mul(Decimal::from(months_paid))
            .ok_or_else(|| overflow("outstanding principal"))?;
        return Ok(principal - paid);
    }

    let factor = growth_factor(rate, months_paid, "outstanding principal")?;
    let accrued = principal
        .checked_mul(factor)
        .ok_or_else(|| overflow("outstanding principal"))?;
    let annuity = (factor - Decimal::ONE)
        .checked_div(rate)
        .ok_or_else(|| overflow("outstanding principal"))?;
    let repaid = installment
        .checked_mul(annuity)
        .ok_or_else(|| overflow("outstanding principal"))?;
    Ok(accrued - repaid)
}

fn growth_factor(rate: Rate, periods: Months, context: &str) -> MicrofinanceResult<Decimal> {
    (Decimal::ONE + rate)
        .checked_powi(i64::from(periods))
        .ok_or_else(|| overflow(context))
}

pub(crate) fn overflow(context: &str) -> MicrofinanceError {
    MicrofinanceError::FinancialImpossibility(format!(
        "{context} exceeds the decimal range"
    ))
}

pub(crate) fn validate_principal(principal: Money) -> MicrofinanceResult<()> {
    if principal <= Decimal::ZERO {
        return Err(MicrofinanceError::invalid(
            "principal",
            "Principal must be positive",
        ));
    }
    Ok(())
}

pub(crate) fn validate_rate(annual_rate_percent: Percent) -> MicrofinanceResult<()> {
    if annual_rate_percent < Decimal::ZERO {
        return Err(MicrofinanceError::invalid(
            "annual_rate_percent",
            "Interest rate cannot be negative",
        ));
    }
    Ok(())
}

pub(crate) fn validate_tenure(tenure_months: Months) -> MicrofinanceResult<()> {
    if tenure_months == 0 {
        return Err(MicrofinanceError::invalid(
            "tenure_months",
            "Tenure must be at least 1 month",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Envelope operations
// ---------------------------------------------------------------------------

/// Loan terms as captured on the loan form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTermsInput {
    pub principal: Money,
    pub annual_rate_percent: Percent,
    pub tenure_months: Months,
}

/// EMI and cost of a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTermsOutput {
    pub monthly_rate: Rate,
    pub emi: Money,
    pub total_interest: Money,
    pub total_payable: Money,
}

/// Outstanding balance query against a known installment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutstandingInput {
    pub principal: Money,
    pub installment: Money,
    pub annual_rate_percent: Percent,
    pub months_paid: Months,
    /// Only used to flag queries past the end of the loan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenure_months: Option<Months>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutstandingOutput {
    pub outstanding_principal: Money,
    pub principal_repaid: Money,
    pub amount_paid: Money,
}

/// EMI, total interest and total payable for a set of loan terms.
pub fn analyze_loan(input: &LoanTermsInput) -> MicrofinanceResult<ComputationOutput<LoanTermsOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let emi = calculate_emi(
        input.principal,
        input.annual_rate_percent,
        input.tenure_months,
    )?;
    let total_payable = emi
        .checked_mul(Decimal::from(input.tenure_months))
        .ok_or_else(|| overflow("total payable"))?;
    let total_interest = total_payable - input.principal;

    if input.annual_rate_percent.is_zero() {
        warnings.push("Interest-free loan; EMI is principal / tenure.".into());
    }
    if input.annual_rate_percent > PERCENT {
        warnings.push(format!(
            "Annual rate of {}% exceeds 100%.",
            input.annual_rate_percent
        ));
    }

    let output = LoanTermsOutput {
        monthly_rate: monthly_rate(input.annual_rate_percent),
        emi,
        total_interest,
        total_payable,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "compounding": "monthly",
        "monthly_rate": "annual_rate_percent / 12 / 100",
        "total_interest_basis": "rounded EMI x tenure - principal"
    });

    Ok(with_metadata(
        "Reducing-balance annuity (EMI)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Outstanding principal, amount paid and principal repaid so far.
pub fn analyze_outstanding(
    input: &OutstandingInput,
) -> MicrofinanceResult<ComputationOutput<OutstandingOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let raw = raw_outstanding(
        input.principal,
        input.installment,
        input.annual_rate_percent,
        input.months_paid,
    )?;
    let outstanding_principal = round_currency(raw.max(Decimal::ZERO));

    if let Some(tenure) = input.tenure_months {
        if input.months_paid > tenure {
            warnings.push(format!(
                "months_paid ({}) exceeds tenure ({tenure} months).",
                input.months_paid
            ));
        }
    }

    let first_interest = input
        .principal
        .checked_mul(monthly_rate(input.annual_rate_percent))
        .ok_or_else(|| overflow("monthly interest"))?;
    if !first_interest.is_zero() && input.installment <= first_interest {
        warnings.push(
            "Installment does not cover monthly interest; the balance grows (negative amortization)."
                .into(),
        );
    }

    if raw < Decimal::ZERO {
        warn!(%raw, "outstanding balance clamped to zero");
        warnings.push(format!(
            "Payments exceed the balance by {}; outstanding floored at zero.",
            round_currency(-raw)
        ));
    }

    let amount_paid = input
        .installment
        .checked_mul(Decimal::from(input.months_paid))
        .ok_or_else(|| overflow("amount paid"))?;
    let principal_repaid = input.principal - outstanding_principal;

    let output = OutstandingOutput {
        outstanding_principal,
        principal_repaid,
        amount_paid,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "compounding": "monthly",
        "payments": "end of month, fixed installment",
        "floor": "balance never reported below zero"
    });

    Ok(with_metadata(
        "Reducing-balance outstanding principal",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}
