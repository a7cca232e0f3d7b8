//! Credit domain error types.

use common::{Money, UnsupportedTenor};
use credit_store::StoreError;
use thiserror::Error;

/// Errors that can occur during credit operations.
#[derive(Debug, Error)]
pub enum CreditError {
    /// The requested repayment period is not a supported tenor.
    #[error("unsupported tenor: {0} months")]
    InvalidTenor(u8),

    /// The purchase or adjustment does not fit in the remaining capacity.
    ///
    /// For a purchase this means a `FAILED` ledger entry was committed
    /// before the error was returned.
    #[error("insufficient capacity: requested {requested}, available {available}")]
    InsufficientCapacity { requested: Money, available: Money },

    /// Utilization adjustments must move the balance up by a positive amount.
    #[error("adjustment amount must be positive, got {0}")]
    NonPositiveAdjustment(Money),

    /// An error occurred in the credit store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<UnsupportedTenor> for CreditError {
    fn from(e: UnsupportedTenor) -> Self {
        CreditError::InvalidTenor(e.0)
    }
}
