//! Persisted row shapes: credit limits and ledger entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{AssetId, ConsumerId, Money, Tenor};

/// A consumer's credit ceiling and current utilization for one tenor.
///
/// Created once per tenor at onboarding, mutated only through
/// [`LimitStore::set_utilized`](crate::store::LimitStore::set_utilized),
/// never deleted. After every committed transaction
/// `0 <= utilized <= ceiling` holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditLimit {
    pub id: i64,
    pub consumer_id: ConsumerId,
    pub tenor: Tenor,
    /// Maximum principal the consumer may have outstanding for this tenor.
    pub ceiling: Money,
    /// Principal currently committed against the ceiling.
    pub utilized: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreditLimit {
    /// Remaining capacity: `ceiling - utilized`.
    pub fn available(&self) -> Money {
        self.ceiling - self.utilized
    }
}

/// Outcome of one purchase attempt.
///
/// Stored as `"SUCCESS"` / `"FAILED"` text; the strings are a compatibility
/// contract with the persisted schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum PurchaseOutcome {
    #[sqlx(rename = "SUCCESS")]
    #[serde(rename = "SUCCESS")]
    Succeeded,
    #[sqlx(rename = "FAILED")]
    #[serde(rename = "FAILED")]
    Failed,
}

impl std::fmt::Display for PurchaseOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PurchaseOutcome::Succeeded => write!(f, "SUCCESS"),
            PurchaseOutcome::Failed => write!(f, "FAILED"),
        }
    }
}

/// An immutable ledger entry for one purchase attempt.
///
/// Declined attempts are retained for audit, so an entry exists for every
/// attempt that passed tenor validation regardless of outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: i64,
    /// Externally visible contract number, unique per attempt including
    /// failed ones.
    pub contract_no: String,
    pub consumer_id: ConsumerId,
    /// The credit limit row this attempt was evaluated against.
    pub credit_limit_id: i64,
    pub asset_id: AssetId,
    pub tenor: Tenor,
    /// Financed asset price; the only component that consumes capacity.
    pub principal: Money,
    pub fee: Money,
    pub interest: Money,
    /// Zero on declined attempts; a decline has no repayment schedule.
    pub installment: Money,
    pub outcome: PurchaseOutcome,
    pub created_at: DateTime<Utc>,
}

/// A ledger entry ready to be appended; the store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPurchaseRecord {
    pub contract_no: String,
    pub consumer_id: ConsumerId,
    pub credit_limit_id: i64,
    pub asset_id: AssetId,
    pub tenor: Tenor,
    pub principal: Money,
    pub fee: Money,
    pub interest: Money,
    pub installment: Money,
    pub outcome: PurchaseOutcome,
}
