//! Monetary amounts in minor currency units.

use serde::{Deserialize, Serialize};

/// Money amount represented in minor currency units (cents) to avoid
/// floating point issues.
///
/// Fee and interest percentages are expressed in basis points
/// (1 bp = 0.01%) and applied with [`Money::mul_bps`], which rounds half
/// away from zero. Rounding happens at each computation step, never once
/// at the end; differing rounding order changes results at the cent level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in minor units (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from minor units.
    pub const fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub const fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in minor units.
    pub const fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the major-unit portion (whole number).
    pub const fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the minor-unit portion (remainder after major units).
    pub const fn cents_part(&self) -> i64 {
        (self.cents % 100).abs()
    }

    /// Returns true if the amount is positive.
    pub const fn is_positive(&self) -> bool {
        self.cents > 0
    }

    /// Returns true if the amount is zero.
    pub const fn is_zero(&self) -> bool {
        self.cents == 0
    }

    /// Returns true if the amount is negative.
    pub const fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a rate in basis points, rounding half away from zero.
    ///
    /// Widens to i128 internally so large principals cannot overflow the
    /// intermediate product.
    pub fn mul_bps(&self, bps: i64) -> Money {
        let product = self.cents as i128 * bps as i128;
        Money::from_cents(div_round_half_away(product, 10_000) as i64)
    }

    /// Divides by a positive integer, rounding half away from zero.
    ///
    /// # Panics
    ///
    /// Panics if `divisor` is not positive.
    pub fn div_round(&self, divisor: i64) -> Money {
        assert!(divisor > 0, "divisor must be positive");
        Money::from_cents(div_round_half_away(self.cents as i128, divisor as i128) as i64)
    }
}

/// Integer division rounding half away from zero. `den` must be positive.
fn div_round_half_away(num: i128, den: i128) -> i128 {
    if num >= 0 {
        (num + den / 2) / den
    } else {
        -((-num + den / 2) / den)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents - rhs.cents,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents += rhs.cents;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.cents -= rhs.cents;
    }
}
