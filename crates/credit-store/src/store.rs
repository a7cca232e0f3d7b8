use async_trait::async_trait;

use common::{ConsumerId, Money, Tenor};

use crate::record::{CreditLimit, NewPurchaseRecord, PurchaseRecord};
use crate::Result;

/// One atomic unit of work against the store.
///
/// The purchase orchestrator owns the transaction boundary: it begins a
/// unit of work, passes the handle to [`LimitStore`] and [`Ledger`] calls,
/// and commits or rolls back explicitly. Dropping an uncommitted `Tx`
/// (for example when the caller is cancelled mid-flight) must behave like a
/// rollback: no staged write may become visible.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Transaction handle. Row locks acquired during the transaction are
    /// held by this handle and released when it commits, rolls back, or is
    /// dropped.
    type Tx: Send;

    /// Begins a new unit of work.
    async fn begin(&self) -> Result<Self::Tx>;

    /// Commits the unit of work, making all writes visible atomically.
    async fn commit(&self, tx: Self::Tx) -> Result<()>;

    /// Rolls the unit of work back, discarding all writes.
    async fn rollback(&self, tx: Self::Tx) -> Result<()>;
}

/// Persisted per-(consumer, tenor) credit ceilings and their utilization.
///
/// A passive persistence delegate: invariant enforcement is the caller's
/// responsibility.
#[async_trait]
pub trait LimitStore: UnitOfWork {
    /// Reads the credit limit row with an exclusive hold for the duration
    /// of the transaction.
    ///
    /// Two concurrent transactions fetching the same (consumer, tenor) pair
    /// serialize here: the second blocks until the first commits or rolls
    /// back, then observes the post-commit utilization. The hold must span
    /// the caller's whole read-evaluate-write sequence; releasing it before
    /// the matching [`set_utilized`](LimitStore::set_utilized) reintroduces
    /// the lost-update race.
    async fn fetch_for_update(
        &self,
        tx: &mut Self::Tx,
        consumer: ConsumerId,
        tenor: Tenor,
    ) -> Result<CreditLimit>;

    /// Writes the new utilization value unconditionally.
    ///
    /// Trusts its input: the caller has already evaluated the ceiling
    /// invariant under the exclusive hold. Must run in the same transaction
    /// as the preceding fetch.
    async fn set_utilized(
        &self,
        tx: &mut Self::Tx,
        consumer: ConsumerId,
        tenor: Tenor,
        utilized: Money,
    ) -> Result<()>;
}

/// Append-only ledger of purchase attempts.
#[async_trait]
pub trait Ledger: UnitOfWork {
    /// Appends one ledger entry within the caller's transaction and returns
    /// the generated record id. Never commits or rolls back on its own.
    async fn append(&self, tx: &mut Self::Tx, record: &NewPurchaseRecord) -> Result<i64>;

    /// Returns a consumer's purchase history, most recent first.
    ///
    /// Read-only, no transaction required; a consumer with no history gets
    /// an empty vec, not an error.
    async fn list_by_consumer(&self, consumer: ConsumerId) -> Result<Vec<PurchaseRecord>>;
}

/// Convenience bound for a backend providing both stores over one
/// transaction type.
pub trait CreditStore: LimitStore + Ledger {}

impl<T: LimitStore + Ledger> CreditStore for T {}
