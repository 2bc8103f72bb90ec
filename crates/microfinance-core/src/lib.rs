pub mod amortization;
pub mod error;
pub mod types;

#[cfg(feature = "schedule")]
pub mod schedule;

#[cfg(feature = "portfolio")]
pub mod loan_book;

#[cfg(feature = "portfolio")]
pub mod portfolio;

pub use amortization::{
    calculate_emi, calculate_outstanding_principal, calculate_total_interest, round_currency,
};
pub use error::MicrofinanceError;
pub use types::*;

/// Standard result type for all microfinance operations
pub type MicrofinanceResult<T> = Result<T, MicrofinanceError>;
