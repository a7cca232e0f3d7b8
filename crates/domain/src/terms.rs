//! Financial terms derived from an asset price and a tenor.

use common::{Money, Tenor};
use serde::{Deserialize, Serialize};

/// Admin fee, in basis points of the asset price.
pub const FEE_BPS: i64 = 500;

/// Interest per month of tenor, in basis points of the asset price.
pub const INTEREST_BPS_PER_MONTH: i64 = 200;

/// The complete financial breakdown of one purchase.
///
/// All derivation happens here, up front, from two inputs only. The same
/// price and tenor always produce the same terms; rounding is half away
/// from zero at every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialTerms {
    /// Asset price; the amount that counts against the credit limit.
    pub principal: Money,
    /// Flat 5% admin fee on the price.
    pub fee: Money,
    /// Simple interest: 2% of the price per month of tenor.
    pub interest: Money,
    /// Per-month repayment: the rounded total divided across the tenor.
    pub installment: Money,
}

impl FinancialTerms {
    /// Computes the terms for purchasing an asset at `price` over `tenor`.
    pub fn compute(price: Money, tenor: Tenor) -> Self {
        let months = i64::from(tenor.months());
        let fee = price.mul_bps(FEE_BPS);
        let interest = price.mul_bps(INTEREST_BPS_PER_MONTH * months);
        let installment = (price + fee + interest).div_round(months);

        Self {
            principal: price,
            fee,
            interest,
            installment,
        }
    }

    /// Total contract obligation: principal plus fee plus interest.
    pub fn total(&self) -> Money {
        self.principal + self.fee + self.interest
    }
}
