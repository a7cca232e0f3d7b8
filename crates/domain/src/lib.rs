//! Domain layer for the credit core.
//!
//! This crate decides; the stores persist. It provides:
//! - Financial terms derivation (fee, interest, installment)
//! - The purchase orchestrator with its commit-on-decline ledger semantics
//! - Utilization adjustments routed through the same locked sequence
//! - Contract number generation

pub mod contract;
pub mod error;
pub mod service;
pub mod terms;

pub use common::{AssetId, ConsumerId, Money, Tenor};

pub use contract::next_contract_no;
pub use error::CreditError;
pub use service::{CreditService, PurchaseApproval};
pub use terms::{FEE_BPS, FinancialTerms, INTEREST_BPS_PER_MONTH};
