//! Repayment tenor classes.

use serde::{Deserialize, Serialize};

/// The repayment period class a purchase is financed over.
///
/// Only four tenors exist; a consumer is onboarded with one credit limit
/// row per tenor. Serialized as the plain month count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tenor {
    OneMonth,
    TwoMonths,
    ThreeMonths,
    SixMonths,
}

/// Error returned when a month count does not name a supported tenor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedTenor(pub u8);

impl std::fmt::Display for UnsupportedTenor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unsupported tenor: {} months", self.0)
    }
}

impl std::error::Error for UnsupportedTenor {}

impl Tenor {
    /// All supported tenors, shortest first.
    pub const ALL: [Tenor; 4] = [
        Tenor::OneMonth,
        Tenor::TwoMonths,
        Tenor::ThreeMonths,
        Tenor::SixMonths,
    ];

    /// Returns the tenor for the given month count, if supported.
    pub fn from_months(months: u8) -> Option<Self> {
        match months {
            1 => Some(Tenor::OneMonth),
            2 => Some(Tenor::TwoMonths),
            3 => Some(Tenor::ThreeMonths),
            6 => Some(Tenor::SixMonths),
            _ => None,
        }
    }

    /// Returns the number of months in this tenor.
    pub const fn months(&self) -> u8 {
        match self {
            Tenor::OneMonth => 1,
            Tenor::TwoMonths => 2,
            Tenor::ThreeMonths => 3,
            Tenor::SixMonths => 6,
        }
    }
}

impl TryFrom<u8> for Tenor {
    type Error = UnsupportedTenor;

    fn try_from(months: u8) -> Result<Self, Self::Error> {
        Tenor::from_months(months).ok_or(UnsupportedTenor(months))
    }
}

impl From<Tenor> for u8 {
    fn from(tenor: Tenor) -> u8 {
        tenor.months()
    }
}

impl std::fmt::Display for Tenor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} months", self.months())
    }
}
