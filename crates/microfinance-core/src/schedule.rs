use chrono::{Months as CalendarMonths, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::amortization::{
    calculate_emi, monthly_rate, overflow, round_currency, validate_principal, validate_rate,
    validate_tenure,
};
use crate::error::MicrofinanceError;
use crate::types::*;
use crate::MicrofinanceResult;

/// Input for a month-by-month repayment schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub principal: Money,
    pub annual_rate_percent: Percent,
    pub tenure_months: Months,
    /// Fixed installment to schedule; the EMI for the terms when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disbursement_date: Option<NaiveDate>,
}

/// A single month in the repayment schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentPeriod {
    pub period: Months,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub opening_balance: Money,
    pub installment: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

/// Full repayment schedule with totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentScheduleOutput {
    pub installment: Money,
    pub periods: Vec<RepaymentPeriod>,
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_paid: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maturity_date: Option<NaiveDate>,
}

/// Build the monthly repayment schedule of a reducing-balance loan.
///
/// Interest is charged on the opening balance each month and rounded to
/// 2 dp. The last installment is trued up so the loan closes at exactly
/// zero; the schedule stops early if a large installment clears the balance
/// before the final month.
pub fn build_repayment_schedule(
    input: &ScheduleInput,
) -> MicrofinanceResult<ComputationOutput<RepaymentScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_principal(input.principal)?;
    validate_rate(input.annual_rate_percent)?;
    validate_tenure(input.tenure_months)?;

    let installment = match input.installment {
        Some(amount) if amount <= Decimal::ZERO => {
            return Err(MicrofinanceError::invalid(
                "installment",
                "Installment must be positive",
            ));
        }
        Some(amount) => amount,
        None => calculate_emi(
            input.principal,
            input.annual_rate_percent,
            input.tenure_months,
        )?,
    };

    let rate = monthly_rate(input.annual_rate_percent);
    let mut periods = Vec::with_capacity(input.tenure_months as usize);
    let mut balance = input.principal;
    let mut total_interest = Decimal::ZERO;
    let mut total_principal = Decimal::ZERO;
    let mut total_paid = Decimal::ZERO;
    let mut negative_amortization = false;

    for period in 1..=input.tenure_months {
        let opening = balance;
        let interest = round_currency(
            opening
                .checked_mul(rate)
                .ok_or_else(|| overflow("schedule interest"))?,
        );
        let due = opening
            .checked_add(interest)
            .ok_or_else(|| overflow("schedule balance"))?;

        let payment = if period == input.tenure_months || due <= installment {
            due
        } else {
            installment
        };

        let principal_part = payment - interest;
        if principal_part < Decimal::ZERO {
            negative_amortization = true;
        }
        balance = opening
            .checked_sub(principal_part)
            .ok_or_else(|| overflow("schedule balance"))?;

        total_interest = total_interest
            .checked_add(interest)
            .ok_or_else(|| overflow("schedule total interest"))?;
        total_principal = total_principal
            .checked_add(principal_part)
            .ok_or_else(|| overflow("schedule total principal"))?;
        total_paid = total_paid
            .checked_add(payment)
            .ok_or_else(|| overflow("schedule total paid"))?;

        periods.push(RepaymentPeriod {
            period,
            due_date: due_date(input.disbursement_date, period)?,
            opening_balance: opening,
            installment: payment,
            interest,
            principal: principal_part,
            closing_balance: balance,
        });

        if balance.is_zero() {
            break;
        }
    }

    let paid_months = periods.len() as Months;
    if paid_months < input.tenure_months {
        warnings.push(format!(
            "Installment clears the loan after {paid_months} of {} months.",
            input.tenure_months
        ));
    }
    if negative_amortization {
        warnings.push(
            "Installment does not cover monthly interest; unpaid interest is capitalised."
                .into(),
        );
    }
    if let Some(last) = periods.last() {
        if paid_months == input.tenure_months && last.installment != installment {
            let adjustment = last.installment - installment;
            if adjustment.abs() > installment {
                warnings.push(format!(
                    "Final installment of {} is a balloon payment.",
                    last.installment
                ));
            } else {
                debug!(%adjustment, "final installment trued up");
            }
        }
    }

    let maturity_date = periods.last().and_then(|p| p.due_date);

    let output = RepaymentScheduleOutput {
        installment,
        periods,
        total_interest,
        total_principal,
        total_paid,
        maturity_date,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "interest": "opening balance x monthly rate, rounded to 2 dp",
        "final_period": "installment trued up to close the balance",
        "due_dates": "disbursement date plus period months (month-end clamped)"
    });

    Ok(with_metadata(
        "Reducing-balance repayment schedule",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

fn due_date(disbursement: Option<NaiveDate>, period: Months) -> MicrofinanceResult<Option<NaiveDate>> {
    match disbursement {
        None => Ok(None),
        Some(date) => date
            .checked_add_months(CalendarMonths::new(period))
            .map(Some)
            .ok_or_else(|| {
                MicrofinanceError::invalid(
                    "disbursement_date",
                    format!("Due date for period {period} is out of range"),
                )
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn standard_loan() -> ScheduleInput {
        ScheduleInput {
            principal: dec!(50000),
            annual_rate_percent: dec!(12),
            tenure_months: 12,
            installment: None,
            disbursement_date: None,
        }
    }

    #[test]
    fn test_first_periods() {
        let out = build_repayment_schedule(&standard_loan()).unwrap().result;
        let p1 = &out.periods[0];
        assert_eq!(p1.interest, dec!(500.00));
        assert_eq!(p1.principal, dec!(3942.44));
        assert_eq!(p1.closing_balance, dec!(46057.56));

        let p2 = &out.periods[1];
        assert_eq!(p2.opening_balance, dec!(46057.56));
        assert_eq!(p2.interest, dec!(460.58));
        assert_eq!(p2.closing_balance, dec!(42075.70));
    }

    #[test]
    fn test_closes_at_zero() {
        let out = build_repayment_schedule(&standard_loan()).unwrap().result;
        assert_eq!(out.periods.len(), 12);
        assert_eq!(out.periods.last().unwrap().closing_balance, Decimal::ZERO);
        assert_eq!(out.total_principal, dec!(50000));
        assert_eq!(out.total_paid, out.total_principal + out.total_interest);
    }

    #[test]
    fn test_invalid_installment() {
        let mut input = standard_loan();
        input.installment = Some(dec!(0));
        assert!(build_repayment_schedule(&input).is_err());
    }

    #[test]
    fn test_due_date_month_end_clamp() {
        let mut input = standard_loan();
        input.disbursement_date = NaiveDate::from_ymd_opt(2024, 1, 31);
        let out = build_repayment_schedule(&input).unwrap().result;
        assert_eq!(out.periods[0].due_date, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(out.maturity_date, NaiveDate::from_ymd_opt(2025, 1, 31));
    }

    #[test]
    fn test_runaway_capitalisation_is_an_error() {
        // 100% p.a. with a token installment compounds past the decimal range
        let input = ScheduleInput {
            principal: dec!(1000000),
            annual_rate_percent: dec!(100),
            tenure_months: 1000,
            installment: Some(dec!(0.01)),
            disbursement_date: None,
        };
        match build_repayment_schedule(&input) {
            Err(MicrofinanceError::FinancialImpossibility(msg)) => {
                assert!(msg.contains("schedule"))
            }
            other => panic!("Expected FinancialImpossibility, got {other:?}"),
        }
    }
}
