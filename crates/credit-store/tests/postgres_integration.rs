//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p credit-store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use credit_store::{
    AssetCatalog, ConsumerId, Ledger, LimitStore, Money, NewPurchaseRecord, PostgresAssetCatalog,
    PostgresCreditStore, PurchaseOutcome, StoreError, Tenor, UnitOfWork,
};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            // Run migrations using raw_sql to execute multiple statements
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_credit_tables.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresCreditStore {
    let info = get_container_info().await;

    // Create a fresh pool for each test to avoid connection issues
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&info.connection_string)
        .await
        .unwrap();

    // Clear tables for test isolation
    sqlx::query("TRUNCATE TABLE purchase_records, credit_limits, assets")
        .execute(&pool)
        .await
        .unwrap();

    PostgresCreditStore::new(pool)
}

fn new_record(
    consumer: ConsumerId,
    limit_id: i64,
    nonce: i64,
    outcome: PurchaseOutcome,
) -> NewPurchaseRecord {
    NewPurchaseRecord {
        contract_no: format!("C-{consumer}-{nonce}"),
        consumer_id: consumer,
        credit_limit_id: limit_id,
        asset_id: credit_store::AssetId::new(),
        tenor: Tenor::ThreeMonths,
        principal: Money::from_cents(1_000_000),
        fee: Money::from_cents(50_000),
        interest: Money::from_cents(60_000),
        installment: Money::from_cents(370_000),
        outcome,
    }
}

#[tokio::test]
async fn create_and_fetch_limit_for_update() {
    let store = get_test_store().await;
    let consumer = ConsumerId::new();

    let created = store
        .create_limit(consumer, Tenor::ThreeMonths, Money::from_cents(5_000_000))
        .await
        .unwrap();
    assert_eq!(created.utilized.cents(), 0);

    let mut tx = store.begin().await.unwrap();
    let fetched = store
        .fetch_for_update(&mut tx, consumer, Tenor::ThreeMonths)
        .await
        .unwrap();
    store.rollback(tx).await.unwrap();

    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.ceiling.cents(), 5_000_000);
}

#[tokio::test]
async fn fetch_for_update_missing_row_is_not_found() {
    let store = get_test_store().await;

    let mut tx = store.begin().await.unwrap();
    let result = store
        .fetch_for_update(&mut tx, ConsumerId::new(), Tenor::SixMonths)
        .await;
    store.rollback(tx).await.unwrap();

    assert!(matches!(result, Err(StoreError::LimitNotFound { .. })));
}

#[tokio::test]
async fn set_utilized_commits_atomically_with_append() {
    let store = get_test_store().await;
    let consumer = ConsumerId::new();
    let limit = store
        .create_limit(consumer, Tenor::ThreeMonths, Money::from_cents(5_000_000))
        .await
        .unwrap();

    let mut tx = store.begin().await.unwrap();
    store
        .fetch_for_update(&mut tx, consumer, Tenor::ThreeMonths)
        .await
        .unwrap();
    store
        .append(
            &mut tx,
            &new_record(consumer, limit.id, 1, PurchaseOutcome::Succeeded),
        )
        .await
        .unwrap();
    store
        .set_utilized(
            &mut tx,
            consumer,
            Tenor::ThreeMonths,
            Money::from_cents(1_000_000),
        )
        .await
        .unwrap();
    store.commit(tx).await.unwrap();

    let after = store.limit(consumer, Tenor::ThreeMonths).await.unwrap().unwrap();
    assert_eq!(after.utilized.cents(), 1_000_000);

    let history = store.list_by_consumer(consumer).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].outcome, PurchaseOutcome::Succeeded);
    assert_eq!(history[0].principal.cents(), 1_000_000);
}

#[tokio::test]
async fn rollback_discards_both_writes() {
    let store = get_test_store().await;
    let consumer = ConsumerId::new();
    let limit = store
        .create_limit(consumer, Tenor::ThreeMonths, Money::from_cents(5_000_000))
        .await
        .unwrap();

    let mut tx = store.begin().await.unwrap();
    store
        .fetch_for_update(&mut tx, consumer, Tenor::ThreeMonths)
        .await
        .unwrap();
    store
        .append(
            &mut tx,
            &new_record(consumer, limit.id, 2, PurchaseOutcome::Succeeded),
        )
        .await
        .unwrap();
    store
        .set_utilized(
            &mut tx,
            consumer,
            Tenor::ThreeMonths,
            Money::from_cents(1_000_000),
        )
        .await
        .unwrap();
    store.rollback(tx).await.unwrap();

    let after = store.limit(consumer, Tenor::ThreeMonths).await.unwrap().unwrap();
    assert_eq!(after.utilized.cents(), 0);
    assert!(store.list_by_consumer(consumer).await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_contract_no_is_rejected() {
    let store = get_test_store().await;
    let consumer = ConsumerId::new();
    let limit = store
        .create_limit(consumer, Tenor::ThreeMonths, Money::from_cents(5_000_000))
        .await
        .unwrap();

    let record = new_record(consumer, limit.id, 3, PurchaseOutcome::Failed);

    let mut tx = store.begin().await.unwrap();
    store.append(&mut tx, &record).await.unwrap();
    store.commit(tx).await.unwrap();

    let mut tx = store.begin().await.unwrap();
    let result = store.append(&mut tx, &record).await;
    store.rollback(tx).await.unwrap();

    assert!(matches!(result, Err(StoreError::Database(_))));
}

#[tokio::test]
async fn list_by_consumer_is_most_recent_first() {
    let store = get_test_store().await;
    let consumer = ConsumerId::new();
    let limit = store
        .create_limit(consumer, Tenor::ThreeMonths, Money::from_cents(5_000_000))
        .await
        .unwrap();

    for nonce in 10..13 {
        let mut tx = store.begin().await.unwrap();
        store
            .append(
                &mut tx,
                &new_record(consumer, limit.id, nonce, PurchaseOutcome::Succeeded),
            )
            .await
            .unwrap();
        store.commit(tx).await.unwrap();
    }

    let history = store.list_by_consumer(consumer).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history[0].id > history[1].id && history[1].id > history[2].id);

    // Idempotent with no intervening writes
    assert_eq!(history, store.list_by_consumer(consumer).await.unwrap());
}

#[tokio::test]
async fn concurrent_row_locks_serialize_updates() {
    let store = get_test_store().await;
    let consumer = ConsumerId::new();
    store
        .create_limit(consumer, Tenor::ThreeMonths, Money::from_cents(100_000))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let mut tx = store.begin().await.unwrap();
            let limit = store
                .fetch_for_update(&mut tx, consumer, Tenor::ThreeMonths)
                .await
                .unwrap();
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

    // Every increment observed; FOR UPDATE prevented lost updates.
    let after = store.limit(consumer, Tenor::ThreeMonths).await.unwrap().unwrap();
    assert_eq!(after.utilized.cents(), 8_000);
}

#[tokio::test]
async fn asset_catalog_roundtrip() {
    let store = get_test_store().await;
    let catalog = PostgresAssetCatalog::new(store.pool().clone());

    let asset = catalog
        .insert("compact excavator", Money::from_cents(1_000_000))
        .await
        .unwrap();

    let price = catalog.price_of(asset).await.unwrap();
    assert_eq!(price.cents(), 1_000_000);

    let missing = catalog.price_of(credit_store::AssetId::new()).await;
    assert!(matches!(missing, Err(StoreError::AssetNotFound(_))));
}
