//! Portfolio statistics for the lending dashboard.
//!
//! Covers:
//! 1. **Book summary** -- loan count, distinct borrowers, total and average size.
//! 2. **Status distribution** -- count, amount and share per loan status.
//! 3. **Credit quality** -- default rate, amount-weighted interest rate.
//! 4. **Expected cash** -- EMI due per month and outstanding principal on active loans.
//! 5. **Cash movements** -- disbursed, collected, refunded and penalty totals,
//!    collection rate, monthly trends.
//! 6. **Top customers** -- borrowers ranked by total loan amount.
//!
//! Only completed transactions count towards cash totals.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Instant;
use tracing::{debug, warn};

use crate::amortization::{overflow, round_currency};
use crate::loan_book::*;
use crate::types::*;
use crate::MicrofinanceResult;

const DEFAULT_TOP_CUSTOMERS: usize = 5;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// Loans and transactions to summarise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioInput {
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub loans: Vec<LoanRecord>,
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
    #[serde(default)]
    pub customers: Vec<CustomerRecord>,
    /// Number of borrowers to rank; 5 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_customers: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSlice {
    pub status: LoanStatus,
    pub count: u64,
    pub amount: Money,
    /// Share of loan count, in percent (1 dp).
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    /// Calendar month as `YYYY-MM`.
    pub month: String,
    pub disbursed: Money,
    pub collected: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCustomer {
    pub customer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub total_loans: u64,
    pub total_amount: Money,
}

/// Dashboard and report statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub currency: Currency,
    pub total_loans: u64,
    pub total_customers: u64,
    pub total_loan_amount: Money,
    pub average_loan_size: Money,
    pub status_distribution: Vec<StatusSlice>,
    pub active_loans: u64,
    /// Defaulted loans as a percentage of all loans (1 dp).
    pub default_rate: Decimal,
    /// Amount-weighted annual rate in percent (2 dp).
    pub weighted_avg_rate: Percent,
    pub expected_monthly_collection: Money,
    pub outstanding_principal: Money,
    pub total_disbursed: Money,
    pub total_collected: Money,
    pub total_refunded: Money,
    pub total_penalties: Money,
    /// Collected as a percentage of disbursed (1 dp).
    pub collection_rate: Decimal,
    pub monthly_trends: Vec<MonthlyTrend>,
    pub top_customers: Vec<TopCustomer>,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Summarise a loan book and its transactions for the dashboard.
pub fn generate_portfolio_report(
    input: &PortfolioInput,
) -> MicrofinanceResult<ComputationOutput<PortfolioReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    for loan in &input.loans {
        validate_loan(loan)?;
    }
    for txn in &input.transactions {
        validate_transaction(txn)?;
    }

    // Book summary
    let total_loans = input.loans.len() as u64;
    let total_customers = input
        .loans
        .iter()
        .map(|l| l.customer_id.as_str())
        .collect::<BTreeSet<_>>()
        .len() as u64;
    let total_loan_amount = input
        .loans
        .iter()
        .try_fold(Decimal::ZERO, |acc, l| add(acc, l.amount, "total loan amount"))?;
    let average_loan_size = if total_loans > 0 {
        round_currency(total_loan_amount / Decimal::from(total_loans))
    } else {
        Decimal::ZERO
    };

    let status_distribution = build_status_distribution(&input.loans, total_loans)?;
    let count_of = |status: LoanStatus| {
        status_distribution
            .iter()
            .find(|s| s.status == status)
            .map(|s| s.count)
            .unwrap_or(0)
    };
    let active_loans = count_of(LoanStatus::Active);
    let default_rate = percentage(
        Decimal::from(count_of(LoanStatus::Defaulted)),
        Decimal::from(total_loans),
    )?;

    let weighted_avg_rate = if total_loan_amount > Decimal::ZERO {
        let weighted = input.loans.iter().try_fold(Decimal::ZERO, |acc, l| {
            let product = l
                .amount
                .checked_mul(l.interest_rate)
                .ok_or_else(|| overflow("rate-weighted loan amount"))?;
            add(acc, product, "rate-weighted loan amount")
        })?;
        (weighted / total_loan_amount).round_dp(2)
    } else {
        Decimal::ZERO
    };

    // Expected cash from active loans
    let mut expected_monthly_collection = Decimal::ZERO;
    let mut outstanding_principal = Decimal::ZERO;
    for loan in input.loans.iter().filter(|l| l.status == LoanStatus::Active) {
        expected_monthly_collection = add(
            expected_monthly_collection,
            loan.emi()?,
            "expected monthly collection",
        )?;
        outstanding_principal = add(
            outstanding_principal,
            loan.outstanding_principal()?,
            "outstanding principal",
        )?;
        if loan.months_paid.is_some_and(|paid| paid > loan.term) {
            warnings.push(format!(
                "Loan {} is marked active but months_paid exceeds its {}-month term.",
                loan.id, loan.term
            ));
        }
    }

    // Cash movements
    let loan_ids: BTreeSet<&str> = input.loans.iter().map(|l| l.id.as_str()).collect();
    let mut totals: HashMap<TransactionType, Money> = HashMap::new();
    let mut monthly: BTreeMap<String, (Money, Money)> = BTreeMap::new();
    let mut excluded = 0usize;

    for txn in &input.transactions {
        if !loan_ids.contains(txn.loan_id.as_str()) {
            warnings.push(format!(
                "Transaction {} references unknown loan {}.",
                txn.id, txn.loan_id
            ));
        }
        if txn.status != TransactionStatus::Completed {
            excluded += 1;
            continue;
        }

        let total = totals.entry(txn.kind).or_insert(Decimal::ZERO);
        *total = add(*total, txn.amount, "transaction total")?;

        let month = txn.transaction_date.format("%Y-%m").to_string();
        match txn.kind {
            TransactionType::Disbursement => {
                let trend = monthly.entry(month).or_default();
                trend.0 = add(trend.0, txn.amount, "monthly disbursements")?;
            }
            TransactionType::Payment => {
                let trend = monthly.entry(month).or_default();
                trend.1 = add(trend.1, txn.amount, "monthly collections")?;
            }
            TransactionType::Refund | TransactionType::Penalty => {}
        }
    }

    if excluded > 0 {
        warnings.push(format!(
            "{excluded} pending or failed transaction(s) excluded from totals."
        ));
    }

    let total_of = |kind: TransactionType| totals.get(&kind).copied().unwrap_or(Decimal::ZERO);
    let total_disbursed = total_of(TransactionType::Disbursement);
    let total_collected = total_of(TransactionType::Payment);
    let total_refunded = total_of(TransactionType::Refund);
    let total_penalties = total_of(TransactionType::Penalty);

    if total_disbursed.is_zero() && !input.transactions.is_empty() {
        warn!("no completed disbursements; collection rate reported as zero");
        warnings.push("No completed disbursements; collection rate is zero.".into());
    }
    let collection_rate = percentage(total_collected, total_disbursed)?;

    let monthly_trends = monthly
        .into_iter()
        .map(|(month, (disbursed, collected))| MonthlyTrend {
            month,
            disbursed,
            collected,
        })
        .collect();

    let top_customers = rank_customers(
        &input.loans,
        &input.customers,
        input.top_customers.unwrap_or(DEFAULT_TOP_CUSTOMERS),
    )?;

    debug!(
        total_loans,
        total_customers,
        %total_loan_amount,
        %collection_rate,
        "portfolio report generated"
    );

    let output = PortfolioReport {
        currency: input.currency.clone(),
        total_loans,
        total_customers,
        total_loan_amount,
        average_loan_size,
        status_distribution,
        active_loans,
        default_rate,
        weighted_avg_rate,
        expected_monthly_collection,
        outstanding_principal,
        total_disbursed,
        total_collected,
        total_refunded,
        total_penalties,
        collection_rate,
        monthly_trends,
        top_customers,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "cash_totals": "completed transactions only",
        "expected_collection": "sum of EMIs on active loans",
        "outstanding": "EMI schedule after months_paid on active loans",
        "percentages": "rounded to 1 dp"
    });

    Ok(with_metadata(
        "Loan portfolio summary",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn add(acc: Money, amount: Money, context: &str) -> MicrofinanceResult<Money> {
    acc.checked_add(amount).ok_or_else(|| overflow(context))
}

/// `part / whole * 100` at 1 dp; zero when `whole` is zero.
fn percentage(part: Decimal, whole: Decimal) -> MicrofinanceResult<Decimal> {
    if whole.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let ratio = part
        .checked_div(whole)
        .and_then(|r| r.checked_mul(dec!(100)))
        .ok_or_else(|| overflow("percentage"))?;
    Ok(ratio.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
}

fn build_status_distribution(
    loans: &[LoanRecord],
    total_loans: u64,
) -> MicrofinanceResult<Vec<StatusSlice>> {
    let mut by_status: BTreeMap<LoanStatus, (u64, Money)> = BTreeMap::new();
    for loan in loans {
        let entry = by_status.entry(loan.status).or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 = add(entry.1, loan.amount, "status amount")?;
    }

    by_status
        .into_iter()
        .map(|(status, (count, amount))| -> MicrofinanceResult<StatusSlice> {
            Ok(StatusSlice {
                status,
                count,
                amount,
                percentage: percentage(Decimal::from(count), Decimal::from(total_loans))?,
            })
        })
        .collect()
}

fn rank_customers(
    loans: &[LoanRecord],
    customers: &[CustomerRecord],
    limit: usize,
) -> MicrofinanceResult<Vec<TopCustomer>> {
    let names: HashMap<&str, &str> = customers
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let mut by_customer: BTreeMap<&str, (u64, Money)> = BTreeMap::new();
    for loan in loans {
        let entry = by_customer
            .entry(loan.customer_id.as_str())
            .or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 = add(entry.1, loan.amount, "customer loan amount")?;
    }

    // BTreeMap iteration is id-ordered, so the stable sort breaks ties by id
    let mut ranked: Vec<TopCustomer> = by_customer
        .into_iter()
        .map(|(id, (total_loans, total_amount))| TopCustomer {
            customer_id: id.to_string(),
            name: names.get(id).map(|n| n.to_string()),
            total_loans,
            total_amount,
        })
        .collect();
    ranked.sort_by(|a, b| b.total_amount.cmp(&a.total_amount));
    ranked.truncate(limit);
    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(dec!(1), dec!(3)).unwrap(), dec!(33.3));
        assert_eq!(percentage(dec!(2), dec!(3)).unwrap(), dec!(66.7));
        assert_eq!(percentage(dec!(5), dec!(0)).unwrap(), Decimal::ZERO);
        assert!(percentage(Decimal::MAX, dec!(0.01)).is_err());
    }

    #[test]
    fn test_empty_book() {
        let report = generate_portfolio_report(&PortfolioInput::default()).unwrap();
        let r = &report.result;
        assert_eq!(r.total_loans, 0);
        assert_eq!(r.average_loan_size, Decimal::ZERO);
        assert_eq!(r.collection_rate, Decimal::ZERO);
        assert!(r.status_distribution.is_empty());
        assert!(report.warnings.is_empty());
    }
}
