//! Limit store and purchase ledger for the credit core.
//!
//! This crate owns persistence: the per-(consumer, tenor) credit limit rows,
//! the append-only purchase ledger, and the asset price lookup. It holds no
//! business logic; the orchestrator in the `domain` crate decides, the stores
//! here read and write inside the orchestrator's transaction.
//!
//! Two implementations with identical semantics are provided:
//! [`PostgresCreditStore`] (row locks via `SELECT … FOR UPDATE`) and
//! [`InMemoryCreditStore`] (per-row async mutexes with staged writes), the
//! latter primarily for tests.

pub mod assets;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use common::{AssetId, ConsumerId, Money, Tenor};

pub use assets::{AssetCatalog, InMemoryAssetCatalog, PostgresAssetCatalog};
pub use error::{Result, StoreError};
pub use memory::InMemoryCreditStore;
pub use postgres::PostgresCreditStore;
pub use record::{CreditLimit, NewPurchaseRecord, PurchaseOutcome, PurchaseRecord};
pub use store::{CreditStore, Ledger, LimitStore, UnitOfWork};
