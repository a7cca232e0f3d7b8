use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use common::{ConsumerId, Money, Tenor};

use crate::record::{CreditLimit, NewPurchaseRecord, PurchaseRecord};
use crate::store::{Ledger, LimitStore, UnitOfWork};
use crate::{Result, StoreError};

type LimitKey = (ConsumerId, Tenor);

/// In-memory credit store implementation for testing.
///
/// Provides the same interface and semantics as the PostgreSQL
/// implementation: `fetch_for_update` takes a per-row async mutex that is
/// held by the transaction handle until commit or rollback, and writes are
/// staged in the handle and applied atomically on commit. Dropping an
/// uncommitted [`MemoryTx`] discards the stage and releases the row locks.
#[derive(Clone, Default)]
pub struct InMemoryCreditStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    limits: RwLock<HashMap<LimitKey, CreditLimit>>,
    records: RwLock<Vec<PurchaseRecord>>,
    /// One lock per credit limit row; entries are created lazily and never
    /// removed.
    row_locks: StdMutex<HashMap<LimitKey, Arc<Mutex<()>>>>,
    next_limit_id: AtomicI64,
    next_record_id: AtomicI64,
}

/// Transaction handle for the in-memory store: held row locks plus writes
/// staged until commit.
#[derive(Default)]
pub struct MemoryTx {
    row_guards: HashMap<LimitKey, OwnedMutexGuard<()>>,
    staged_utilized: HashMap<LimitKey, Money>,
    staged_records: Vec<PurchaseRecord>,
}

impl InMemoryCreditStore {
    /// Creates a new empty in-memory credit store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a credit limit row with zero utilization.
    ///
    /// This is the onboarding collaborator's surface (one call per tenor at
    /// consumer registration); the core itself never creates rows.
    pub async fn create_limit(
        &self,
        consumer: ConsumerId,
        tenor: Tenor,
        ceiling: Money,
    ) -> CreditLimit {
        let now = Utc::now();
        let limit = CreditLimit {
            id: self.inner.next_limit_id.fetch_add(1, Ordering::SeqCst) + 1,
            consumer_id: consumer,
            tenor,
            ceiling,
            utilized: Money::zero(),
            created_at: now,
            updated_at: now,
        };

        self.inner
            .limits
            .write()
            .await
            .insert((consumer, tenor), limit.clone());
        limit
    }

    /// Returns the committed state of a limit row, if it exists. Test
    /// helper; does not take the row lock.
    pub async fn limit(&self, consumer: ConsumerId, tenor: Tenor) -> Option<CreditLimit> {
        self.inner.limits.read().await.get(&(consumer, tenor)).cloned()
    }

    /// Returns the total number of committed ledger entries.
    pub async fn record_count(&self) -> usize {
        self.inner.records.read().await.len()
    }

    fn row_lock(&self, key: LimitKey) -> Arc<Mutex<()>> {
        // Clone the Arc out so the map mutex is not held across the await
        // in fetch_for_update.
        self.inner
            .row_locks
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .clone()
    }
}

#[async_trait]
impl UnitOfWork for InMemoryCreditStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx> {
        Ok(MemoryTx::default())
    }

    async fn commit(&self, tx: MemoryTx) -> Result<()> {
        let now = Utc::now();

        {
            let mut limits = self.inner.limits.write().await;
            for (key, utilized) in &tx.staged_utilized {
                if let Some(row) = limits.get_mut(key) {
                    row.utilized = *utilized;
                    row.updated_at = now;
                }
            }
        }

        if !tx.staged_records.is_empty() {
            self.inner.records.write().await.extend(tx.staged_records);
        }

        // Row guards drop here, unblocking waiting transactions.
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTx) -> Result<()> {
        drop(tx);
        Ok(())
    }
}

#[async_trait]
impl LimitStore for InMemoryCreditStore {
    async fn fetch_for_update(
        &self,
        tx: &mut MemoryTx,
        consumer: ConsumerId,
        tenor: Tenor,
    ) -> Result<CreditLimit> {
        let key = (consumer, tenor);

        // Acquire the row lock before reading, unless this transaction
        // already holds it; re-locking our own guard would deadlock.
        if !tx.row_guards.contains_key(&key) {
            let guard = self.row_lock(key).lock_owned().await;
            tx.row_guards.insert(key, guard);
        }

        let limits = self.inner.limits.read().await;
        let mut limit = limits
            .get(&key)
            .cloned()
            .ok_or(StoreError::LimitNotFound { consumer, tenor })?;

        // Within one transaction, a staged write shadows the committed row.
        if let Some(&staged) = tx.staged_utilized.get(&key) {
            limit.utilized = staged;
        }

        Ok(limit)
    }

    async fn set_utilized(
        &self,
        tx: &mut MemoryTx,
        consumer: ConsumerId,
        tenor: Tenor,
        utilized: Money,
    ) -> Result<()> {
        let key = (consumer, tenor);

        if !self.inner.limits.read().await.contains_key(&key) {
            return Err(StoreError::LimitNotFound { consumer, tenor });
        }

        tx.staged_utilized.insert(key, utilized);
        Ok(())
    }
}

#[async_trait]
impl Ledger for InMemoryCreditStore {
    async fn append(&self, tx: &mut MemoryTx, record: &NewPurchaseRecord) -> Result<i64> {
        // Ids come from a shared sequence, so rolled-back attempts leave
        // gaps exactly like a database sequence would.
        let id = self.inner.next_record_id.fetch_add(1, Ordering::SeqCst) + 1;

        tx.staged_records.push(PurchaseRecord {
            id,
            contract_no: record.contract_no.clone(),
            consumer_id: record.consumer_id,
            credit_limit_id: record.credit_limit_id,
            asset_id: record.asset_id,
            tenor: record.tenor,
            principal: record.principal,
            fee: record.fee,
            interest: record.interest,
            installment: record.installment,
            outcome: record.outcome,
            created_at: Utc::now(),
        });

        Ok(id)
    }

    async fn list_by_consumer(&self, consumer: ConsumerId) -> Result<Vec<PurchaseRecord>> {
        let records = self.inner.records.read().await;
        let mut history: Vec<_> = records
            .iter()
            .filter(|r| r.consumer_id == consumer)
            .cloned()
            .collect();

        // Most recent first; id breaks timestamp ties.
        history.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.id.cmp(&a.id))
        });

        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use common::AssetId;

    use super::*;
    use crate::record::PurchaseOutcome;

    fn new_record(consumer: ConsumerId, limit_id: i64, outcome: PurchaseOutcome) -> NewPurchaseRecord {
        NewPurchaseRecord {
            contract_no: format!("C-{consumer}-{}", rand_nonce()),
            consumer_id: consumer,
            credit_limit_id: limit_id,
            asset_id: AssetId::new(),
            tenor: Tenor::ThreeMonths,
            principal: Money::from_cents(1_000_000),
            fee: Money::from_cents(50_000),
            interest: Money::from_cents(60_000),
            installment: Money::from_cents(370_000),
            outcome,
        }
    }

    fn rand_nonce() -> i64 {
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    }

    #[tokio::test]
    async fn fetch_for_update_returns_seeded_row() {
        let store = InMemoryCreditStore::new();
        let consumer = ConsumerId::new();
        store
            .create_limit(consumer, Tenor::ThreeMonths, Money::from_cents(5_000_000))
            .await;

        let mut tx = store.begin().await.unwrap();
        let limit = store
            .fetch_for_update(&mut tx, consumer, Tenor::ThreeMonths)
            .await
            .unwrap();
        store.rollback(tx).await.unwrap();

        assert_eq!(limit.ceiling.cents(), 5_000_000);
        assert_eq!(limit.utilized.cents(), 0);
    }

    #[tokio::test]
    async fn fetch_for_update_missing_row_is_not_found() {
        let store = InMemoryCreditStore::new();

        let mut tx = store.begin().await.unwrap();
        let result = store
            .fetch_for_update(&mut tx, ConsumerId::new(), Tenor::SixMonths)
            .await;

        assert!(matches!(result, Err(StoreError::LimitNotFound { .. })));
    }

    #[tokio::test]
    async fn commit_applies_staged_utilization() {
        let store = InMemoryCreditStore::new();
        let consumer = ConsumerId::new();
        store
            .create_limit(consumer, Tenor::OneMonth, Money::from_cents(1_000))
            .await;

        let mut tx = store.begin().await.unwrap();
        store
            .fetch_for_update(&mut tx, consumer, Tenor::OneMonth)
            .await
            .unwrap();
        store
            .set_utilized(&mut tx, consumer, Tenor::OneMonth, Money::from_cents(400))
            .await
            .unwrap();
        store.commit(tx).await.unwrap();

        let limit = store.limit(consumer, Tenor::OneMonth).await.unwrap();
        assert_eq!(limit.utilized.cents(), 400);
    }

    #[tokio::test]
    async fn rollback_discards_staged_writes() {
        let store = InMemoryCreditStore::new();
        let consumer = ConsumerId::new();
        let limit = store
            .create_limit(consumer, Tenor::OneMonth, Money::from_cents(1_000))
            .await;

        let mut tx = store.begin().await.unwrap();
        store
            .fetch_for_update(&mut tx, consumer, Tenor::OneMonth)
            .await
            .unwrap();
        store
            .set_utilized(&mut tx, consumer, Tenor::OneMonth, Money::from_cents(999))
            .await
            .unwrap();
        store
            .append(&mut tx, &new_record(consumer, limit.id, PurchaseOutcome::Succeeded))
            .await
            .unwrap();
        store.rollback(tx).await.unwrap();

        let limit = store.limit(consumer, Tenor::OneMonth).await.unwrap();
        assert_eq!(limit.utilized.cents(), 0);
        assert_eq!(store.record_count().await, 0);
    }

    #[tokio::test]
    async fn dropping_transaction_behaves_like_rollback() {
        let store = InMemoryCreditStore::new();
        let consumer = ConsumerId::new();
        store
            .create_limit(consumer, Tenor::OneMonth, Money::from_cents(1_000))
            .await;

        {
            let mut tx = store.begin().await.unwrap();
            store
                .fetch_for_update(&mut tx, consumer, Tenor::OneMonth)
                .await
                .unwrap();
            store
                .set_utilized(&mut tx, consumer, Tenor::OneMonth, Money::from_cents(999))
                .await
                .unwrap();
            // tx dropped without commit
        }

        let limit = store.limit(consumer, Tenor::OneMonth).await.unwrap();
        assert_eq!(limit.utilized.cents(), 0);

        // The row lock was released by the drop: a new transaction can
        // fetch without blocking.
        let mut tx = store.begin().await.unwrap();
        store
            .fetch_for_update(&mut tx, consumer, Tenor::OneMonth)
            .await
            .unwrap();
        store.rollback(tx).await.unwrap();
    }

    #[tokio::test]
    async fn staged_write_shadows_committed_row_within_transaction() {
        let store = InMemoryCreditStore::new();
        let consumer = ConsumerId::new();
        store
            .create_limit(consumer, Tenor::OneMonth, Money::from_cents(1_000))
            .await;

        let mut tx = store.begin().await.unwrap();
        store
            .fetch_for_update(&mut tx, consumer, Tenor::OneMonth)
            .await
            .unwrap();
        store
            .set_utilized(&mut tx, consumer, Tenor::OneMonth, Money::from_cents(300))
            .await
            .unwrap();

        let reread = store
            .fetch_for_update(&mut tx, consumer, Tenor::OneMonth)
            .await
            .unwrap();
        store.rollback(tx).await.unwrap();

        assert_eq!(reread.utilized.cents(), 300);
    }

    #[tokio::test]
    async fn concurrent_transactions_on_same_row_serialize() {
        let store = InMemoryCreditStore::new();
        let consumer = ConsumerId::new();
        store
            .create_limit(consumer, Tenor::ThreeMonths, Money::from_cents(10_000))
            .await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut tx = store.begin().await.unwrap();
                let limit = store
                    .fetch_for_update(&mut tx, consumer, Tenor::ThreeMonths)
                    .await
                    .unwrap();
                // Widen the race window: hold the row across a yield.
                tokio::time::sleep(Duration::from_millis(2)).await;
                store
                    .set_utilized(
                        &mut tx,
                        consumer,
                        Tenor::ThreeMonths,
                        limit.utilized + Money::from_cents(1_000),
                    )
                    .await
                    .unwrap();
                store.commit(tx).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // No lost update: every increment is observed.
        let limit = store.limit(consumer, Tenor::ThreeMonths).await.unwrap();
        assert_eq!(limit.utilized.cents(), 8_000);
    }

    #[tokio::test]
    async fn transactions_on_different_rows_do_not_block_each_other() {
        let store = InMemoryCreditStore::new();
        let consumer = ConsumerId::new();
        store
            .create_limit(consumer, Tenor::OneMonth, Money::from_cents(1_000))
            .await;
        store
            .create_limit(consumer, Tenor::SixMonths, Money::from_cents(1_000))
            .await;

        // Hold the one-month row in an open transaction.
        let mut held = store.begin().await.unwrap();
        store
            .fetch_for_update(&mut held, consumer, Tenor::OneMonth)
            .await
            .unwrap();

        // The six-month row is still reachable without waiting.
        let other = tokio::time::timeout(Duration::from_millis(100), async {
            let mut tx = store.begin().await.unwrap();
            let limit = store
                .fetch_for_update(&mut tx, consumer, Tenor::SixMonths)
                .await
                .unwrap();
            store.rollback(tx).await.unwrap();
            limit
        })
        .await
        .expect("different rows must not share a lock");

        assert_eq!(other.tenor, Tenor::SixMonths);
        store.rollback(held).await.unwrap();
    }

    #[tokio::test]
    async fn list_by_consumer_is_most_recent_first_and_idempotent() {
        let store = InMemoryCreditStore::new();
        let consumer = ConsumerId::new();
        let limit = store
            .create_limit(consumer, Tenor::ThreeMonths, Money::from_cents(10_000_000))
            .await;

        for outcome in [
            PurchaseOutcome::Succeeded,
            PurchaseOutcome::Failed,
            PurchaseOutcome::Succeeded,
        ] {
            let mut tx = store.begin().await.unwrap();
            store
                .append(&mut tx, &new_record(consumer, limit.id, outcome))
                .await
                .unwrap();
            store.commit(tx).await.unwrap();
        }

        let first = store.list_by_consumer(consumer).await.unwrap();
        let second = store.list_by_consumer(consumer).await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert!(first[0].id > first[1].id && first[1].id > first[2].id);
        assert_eq!(first[1].outcome, PurchaseOutcome::Failed);
    }

    #[tokio::test]
    async fn list_by_consumer_empty_history_is_not_an_error() {
        let store = InMemoryCreditStore::new();
        let history = store.list_by_consumer(ConsumerId::new()).await.unwrap();
        assert!(history.is_empty());
    }
}
