//! Loan and transaction records as kept by the lending back office.
//!
//! Field constraints mirror the document schema: loan amount positive,
//! interest rate between 0% and 100%, term of at least one month,
//! transaction amounts non-negative.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::amortization::{calculate_emi, calculate_outstanding_principal};
use crate::error::MicrofinanceError;
use crate::types::*;
use crate::MicrofinanceResult;

const MAX_RATE_PERCENT: Decimal = dec!(100);

/// Lifecycle of a loan, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Approved,
    Active,
    Completed,
    Defaulted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Payment,
    Disbursement,
    Refund,
    Penalty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

/// A loan on the book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRecord {
    pub id: String,
    pub customer_id: String,
    pub amount: Money,
    /// Annual percentage rate (12 = 12%).
    pub interest_rate: Percent,
    /// Term in months.
    pub term: Months,
    pub status: LoanStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disbursement_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maturity_date: Option<NaiveDate>,
    /// Installments paid so far; zero when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub months_paid: Option<Months>,
}

impl LoanRecord {
    /// EMI for the loan's amount, rate and term.
    pub fn emi(&self) -> MicrofinanceResult<Money> {
        calculate_emi(self.amount, self.interest_rate, self.term)
    }

    /// Outstanding principal after `months_paid` installments of the EMI.
    pub fn outstanding_principal(&self) -> MicrofinanceResult<Money> {
        let emi = self.emi()?;
        calculate_outstanding_principal(
            self.amount,
            emi,
            self.interest_rate,
            self.months_paid.unwrap_or(0),
        )
    }
}

/// A money movement against a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub loan_id: String,
    pub customer_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Money,
    pub status: TransactionStatus,
    pub transaction_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Display details for a borrower.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: String,
    pub name: String,
}

/// Check a loan against the schema constraints.
pub fn validate_loan(loan: &LoanRecord) -> MicrofinanceResult<()> {
    let field = |name: &str| format!("loan[{}].{name}", loan.id);

    if loan.id.trim().is_empty() {
        return Err(MicrofinanceError::invalid("loan.id", "Loan ID is required"));
    }
    if loan.customer_id.trim().is_empty() {
        return Err(MicrofinanceError::invalid(
            field("customer_id"),
            "Customer ID is required",
        ));
    }
    if loan.amount <= Decimal::ZERO {
        return Err(MicrofinanceError::invalid(
            field("amount"),
            "Loan amount must be positive",
        ));
    }
    if loan.interest_rate < Decimal::ZERO {
        return Err(MicrofinanceError::invalid(
            field("interest_rate"),
            "Interest rate cannot be negative",
        ));
    }
    if loan.interest_rate > MAX_RATE_PERCENT {
        return Err(MicrofinanceError::invalid(
            field("interest_rate"),
            "Interest rate cannot exceed 100%",
        ));
    }
    if loan.term == 0 {
        return Err(MicrofinanceError::invalid(
            field("term"),
            "Loan term must be at least 1 month",
        ));
    }
    if let (Some(disbursed), Some(maturity)) = (loan.disbursement_date, loan.maturity_date) {
        if maturity < disbursed {
            return Err(MicrofinanceError::invalid(
                field("maturity_date"),
                "Maturity date precedes disbursement date",
            ));
        }
    }
    Ok(())
}

/// Check a transaction against the schema constraints.
pub fn validate_transaction(txn: &TransactionRecord) -> MicrofinanceResult<()> {
    let field = |name: &str| format!("transaction[{}].{name}", txn.id);

    if txn.id.trim().is_empty() {
        return Err(MicrofinanceError::invalid(
            "transaction.id",
            "Transaction ID is required",
        ));
    }
    if txn.loan_id.trim().is_empty() {
        return Err(MicrofinanceError::invalid(field("loan_id"), "Loan ID is required"));
    }
    if txn.customer_id.trim().is_empty() {
        return Err(MicrofinanceError::invalid(
            field("customer_id"),
            "Customer ID is required",
        ));
    }
    if txn.amount < Decimal::ZERO {
        return Err(MicrofinanceError::invalid(
            field("amount"),
            "Transaction amount cannot be negative",
        ));
    }
    Ok(())
}
