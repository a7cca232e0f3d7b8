//! Shared value types for the credit core.
//!
//! Everything in this crate is a plain value: typed identifiers, monetary
//! amounts in minor currency units, and the closed set of repayment tenors.
//! No I/O lives here.

pub mod money;
pub mod tenor;
pub mod types;

pub use money::Money;
pub use tenor::{Tenor, UnsupportedTenor};
pub use types::{AssetId, ConsumerId};
