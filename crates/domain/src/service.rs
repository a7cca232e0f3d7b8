//! Purchase orchestration over the credit store.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use common::{AssetId, ConsumerId, Money, Tenor};
use credit_store::{
    AssetCatalog, CreditLimit, CreditStore, Ledger, LimitStore, NewPurchaseRecord, PurchaseOutcome,
    PurchaseRecord, UnitOfWork,
};

use crate::contract::next_contract_no;
use crate::error::CreditError;
use crate::terms::FinancialTerms;

/// The result of an approved purchase.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseApproval {
    /// Ledger id of the committed `SUCCESS` entry.
    pub record_id: i64,
    pub contract_no: String,
    pub consumer_id: ConsumerId,
    pub asset_id: AssetId,
    pub tenor: Tenor,
    pub terms: FinancialTerms,
}

/// Outcome of the locked purchase evaluation, before commit.
enum PurchaseDecision {
    Approved(PurchaseApproval),
    Declined { requested: Money, available: Money },
}

/// Service orchestrating purchases and utilization adjustments.
///
/// The service owns the transaction boundary: every capacity decision runs
/// between a `fetch_for_update` and the matching commit, so concurrent
/// requests against the same (consumer, tenor) limit serialize on the row
/// and each one evaluates against the state its predecessor committed.
pub struct CreditService<S: CreditStore, A: AssetCatalog> {
    store: S,
    catalog: A,
}

impl<S: CreditStore, A: AssetCatalog> CreditService<S, A> {
    /// Creates a new credit service over the given store and asset catalog.
    pub fn new(store: S, catalog: A) -> Self {
        Self { store, catalog }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a reference to the asset catalog.
    pub fn catalog(&self) -> &A {
        &self.catalog
    }

    /// Attempts to purchase an asset on credit.
    ///
    /// The tenor and asset price are resolved before any lock is taken; the
    /// capacity check, the ledger append, and the utilization bump then run
    /// in one transaction under an exclusive hold on the limit row.
    ///
    /// A declined purchase is not silent: the `FAILED` ledger entry is
    /// committed first, and only then does the call return
    /// [`CreditError::InsufficientCapacity`].
    #[tracing::instrument(skip(self))]
    pub async fn purchase(
        &self,
        consumer: ConsumerId,
        asset: AssetId,
        tenor_months: u8,
    ) -> Result<PurchaseApproval, CreditError> {
        let started = Instant::now();

        // Reject unsupported tenors before touching the store; no ledger
        // entry is written for a malformed request.
        let tenor = Tenor::try_from(tenor_months)?;
        let price = self.catalog.price_of(asset).await?;
        let terms = FinancialTerms::compute(price, tenor);

        let mut tx = self.store.begin().await?;
        let decision = self
            .evaluate_purchase(&mut tx, consumer, asset, tenor, &terms)
            .await;

        let decision = match decision {
            Ok(decision) => {
                // Committed on both branches: an approval persists the new
                // utilization, a decline persists the FAILED entry.
                self.store.commit(tx).await?;
                decision
            }
            Err(e) => {
                if let Err(rollback_err) = self.store.rollback(tx).await {
                    warn!(error = %rollback_err, "rollback failed after purchase error");
                }
                return Err(e);
            }
        };

        metrics::histogram!("purchase_duration_seconds").record(started.elapsed().as_secs_f64());

        match decision {
            PurchaseDecision::Approved(approval) => {
                metrics::counter!("purchases_approved_total").increment(1);
                info!(
                    contract_no = %approval.contract_no,
                    principal = %approval.terms.principal,
                    "purchase approved"
                );
                Ok(approval)
            }
            PurchaseDecision::Declined {
                requested,
                available,
            } => {
                metrics::counter!("purchases_declined_total").increment(1);
                info!(%requested, %available, "purchase declined");
                Err(CreditError::InsufficientCapacity {
                    requested,
                    available,
                })
            }
        }
    }

    /// The locked part of the purchase: everything here runs under the
    /// exclusive hold taken by `fetch_for_update` and is committed or rolled
    /// back as one unit by the caller.
    async fn evaluate_purchase(
        &self,
        tx: &mut S::Tx,
        consumer: ConsumerId,
        asset: AssetId,
        tenor: Tenor,
        terms: &FinancialTerms,
    ) -> Result<PurchaseDecision, CreditError> {
        let limit = self.store.fetch_for_update(tx, consumer, tenor).await?;
        let available = limit.available();

        debug!(%consumer, %tenor, %available, principal = %terms.principal, "evaluating capacity");

        let contract_no = next_contract_no(consumer);
        let approved = terms.principal <= available;
        let record = NewPurchaseRecord {
            contract_no: contract_no.clone(),
            consumer_id: consumer,
            credit_limit_id: limit.id,
            asset_id: asset,
            tenor,
            principal: terms.principal,
            fee: terms.fee,
            interest: terms.interest,
            // A declined attempt never produces a repayment schedule.
            installment: if approved {
                terms.installment
            } else {
                Money::zero()
            },
            outcome: if approved {
                PurchaseOutcome::Succeeded
            } else {
                PurchaseOutcome::Failed
            },
        };

        let record_id = self.store.append(tx, &record).await?;

        if !approved {
            return Ok(PurchaseDecision::Declined {
                requested: terms.principal,
                available,
            });
        }

        self.store
            .set_utilized(tx, consumer, tenor, limit.utilized + terms.principal)
            .await?;

        Ok(PurchaseDecision::Approved(PurchaseApproval {
            record_id,
            contract_no,
            consumer_id: consumer,
            asset_id: asset,
            tenor,
            terms: *terms,
        }))
    }

    /// Raises a consumer's utilization by `amount` without a purchase.
    ///
    /// Runs through the same locked read-evaluate-write sequence as
    /// [`purchase`](CreditService::purchase), so it cannot race a concurrent
    /// purchase into a lost update. The amount must be positive and the new
    /// utilization may not exceed the ceiling; no ledger entry is written.
    #[tracing::instrument(skip(self))]
    pub async fn increase_utilization(
        &self,
        consumer: ConsumerId,
        tenor_months: u8,
        amount: Money,
    ) -> Result<CreditLimit, CreditError> {
        let tenor = Tenor::try_from(tenor_months)?;
        if !amount.is_positive() {
            return Err(CreditError::NonPositiveAdjustment(amount));
        }

        let mut tx = self.store.begin().await?;
        let result = self.apply_adjustment(&mut tx, consumer, tenor, amount).await;

        match result {
            Ok(limit) => {
                self.store.commit(tx).await?;
                info!(%consumer, %tenor, %amount, "utilization adjusted");
                Ok(limit)
            }
            Err(e) => {
                if let Err(rollback_err) = self.store.rollback(tx).await {
                    warn!(error = %rollback_err, "rollback failed after adjustment error");
                }
                Err(e)
            }
        }
    }

    async fn apply_adjustment(
        &self,
        tx: &mut S::Tx,
        consumer: ConsumerId,
        tenor: Tenor,
        amount: Money,
    ) -> Result<CreditLimit, CreditError> {
        let mut limit = self.store.fetch_for_update(tx, consumer, tenor).await?;
        let available = limit.available();

        if amount > available {
            return Err(CreditError::InsufficientCapacity {
                requested: amount,
                available,
            });
        }

        limit.utilized = limit.utilized + amount;
        self.store
            .set_utilized(tx, consumer, tenor, limit.utilized)
            .await?;

        Ok(limit)
    }

    /// Returns a consumer's purchase history, most recent first.
    ///
    /// Includes both `SUCCESS` and `FAILED` attempts; a consumer with no
    /// history gets an empty list.
    #[tracing::instrument(skip(self))]
    pub async fn list_purchases(
        &self,
        consumer: ConsumerId,
    ) -> Result<Vec<PurchaseRecord>, CreditError> {
        Ok(self.store.list_by_consumer(consumer).await?)
    }
}
