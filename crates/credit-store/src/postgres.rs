use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use tracing::debug;
use uuid::Uuid;

use common::{AssetId, ConsumerId, Money, Tenor};

use crate::record::{CreditLimit, NewPurchaseRecord, PurchaseOutcome, PurchaseRecord};
use crate::store::{Ledger, LimitStore, UnitOfWork};
use crate::{Result, StoreError};

/// PostgreSQL-backed credit store implementation.
///
/// Exclusivity comes from `SELECT … FOR UPDATE` row locks: the lock taken at
/// fetch time is held until the enclosing transaction commits or rolls back,
/// so the read-evaluate-write sequence on one credit limit row is
/// indivisible. Dropping an uncommitted [`sqlx::Transaction`] rolls it back.
#[derive(Clone)]
pub struct PostgresCreditStore {
    pool: PgPool,
}

impl PostgresCreditStore {
    /// Creates a new PostgreSQL credit store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
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
    ) -> Result<CreditLimit> {
        let row = sqlx::query(
            r#"
            INSERT INTO credit_limits (consumer_id, tenor_months, ceiling, utilized, created_at, updated_at)
            VALUES ($1, $2, $3, 0, NOW(), NOW())
            RETURNING id, consumer_id, tenor_months, ceiling, utilized, created_at, updated_at
            "#,
        )
        .bind(consumer.as_uuid())
        .bind(i16::from(tenor.months()))
        .bind(ceiling.cents())
        .fetch_one(&self.pool)
        .await?;

        row_to_limit(row)
    }

    /// Returns the committed state of a limit row, if it exists. Plain read,
    /// no lock; used by collaborators and tests.
    pub async fn limit(&self, consumer: ConsumerId, tenor: Tenor) -> Result<Option<CreditLimit>> {
        let row = sqlx::query(
            r#"
            SELECT id, consumer_id, tenor_months, ceiling, utilized, created_at, updated_at
            FROM credit_limits
            WHERE consumer_id = $1 AND tenor_months = $2
            "#,
        )
        .bind(consumer.as_uuid())
        .bind(i16::from(tenor.months()))
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_limit).transpose()
    }
}

fn row_to_limit(row: PgRow) -> Result<CreditLimit> {
    let months: i16 = row.try_get("tenor_months")?;
    let tenor = Tenor::from_months(months as u8)
        .ok_or_else(|| StoreError::Database(sqlx::Error::Decode(
            format!("credit_limits row carries unsupported tenor {months}").into(),
        )))?;

    Ok(CreditLimit {
        id: row.try_get("id")?,
        consumer_id: ConsumerId::from_uuid(row.try_get::<Uuid, _>("consumer_id")?),
        tenor,
        ceiling: Money::from_cents(row.try_get("ceiling")?),
        utilized: Money::from_cents(row.try_get("utilized")?),
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn row_to_record(row: PgRow) -> Result<PurchaseRecord> {
    let months: i16 = row.try_get("tenor_months")?;
    let tenor = Tenor::from_months(months as u8)
        .ok_or_else(|| StoreError::Database(sqlx::Error::Decode(
            format!("purchase_records row carries unsupported tenor {months}").into(),
        )))?;

    Ok(PurchaseRecord {
        id: row.try_get("id")?,
        contract_no: row.try_get("contract_no")?,
        consumer_id: ConsumerId::from_uuid(row.try_get::<Uuid, _>("consumer_id")?),
        credit_limit_id: row.try_get("credit_limit_id")?,
        asset_id: AssetId::from_uuid(row.try_get::<Uuid, _>("asset_id")?),
        tenor,
        principal: Money::from_cents(row.try_get("principal")?),
        fee: Money::from_cents(row.try_get("fee")?),
        interest: Money::from_cents(row.try_get("interest")?),
        installment: Money::from_cents(row.try_get("installment")?),
        outcome: row.try_get::<PurchaseOutcome, _>("outcome")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[async_trait]
impl UnitOfWork for PostgresCreditStore {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Tx> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: Self::Tx) -> Result<()> {
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<()> {
        tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl LimitStore for PostgresCreditStore {
    async fn fetch_for_update(
        &self,
        tx: &mut Self::Tx,
        consumer: ConsumerId,
        tenor: Tenor,
    ) -> Result<CreditLimit> {
        debug!(%consumer, %tenor, "locking credit limit row");

        let row = sqlx::query(
            r#"
            SELECT id, consumer_id, tenor_months, ceiling, utilized, created_at, updated_at
            FROM credit_limits
            WHERE consumer_id = $1 AND tenor_months = $2
            FOR UPDATE
            "#,
        )
        .bind(consumer.as_uuid())
        .bind(i16::from(tenor.months()))
        .fetch_optional(&mut **tx)
        .await?;

        match row {
            Some(row) => row_to_limit(row),
            None => Err(StoreError::LimitNotFound { consumer, tenor }),
        }
    }

    async fn set_utilized(
        &self,
        tx: &mut Self::Tx,
        consumer: ConsumerId,
        tenor: Tenor,
        utilized: Money,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE credit_limits
            SET utilized = $3, updated_at = NOW()
            WHERE consumer_id = $1 AND tenor_months = $2
            "#,
        )
        .bind(consumer.as_uuid())
        .bind(i16::from(tenor.months()))
        .bind(utilized.cents())
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::LimitNotFound { consumer, tenor });
        }

        Ok(())
    }
}

#[async_trait]
impl Ledger for PostgresCreditStore {
    async fn append(&self, tx: &mut Self::Tx, record: &NewPurchaseRecord) -> Result<i64> {
        debug!(
            contract_no = %record.contract_no,
            outcome = %record.outcome,
            "appending ledger entry"
        );

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO purchase_records (
                contract_no, consumer_id, credit_limit_id, asset_id, tenor_months,
                principal, fee, interest, installment, outcome, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW())
            RETURNING id
            "#,
        )
        .bind(&record.contract_no)
        .bind(record.consumer_id.as_uuid())
        .bind(record.credit_limit_id)
        .bind(record.asset_id.as_uuid())
        .bind(i16::from(record.tenor.months()))
        .bind(record.principal.cents())
        .bind(record.fee.cents())
        .bind(record.interest.cents())
        .bind(record.installment.cents())
        .bind(record.outcome)
        .fetch_one(&mut **tx)
        .await?;

        Ok(id)
    }

    async fn list_by_consumer(&self, consumer: ConsumerId) -> Result<Vec<PurchaseRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, contract_no, consumer_id, credit_limit_id, asset_id, tenor_months,
                   principal, fee, interest, installment, outcome, created_at
            FROM purchase_records
            WHERE consumer_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(consumer.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_record).collect()
    }
}
