//! Contract number generation.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use common::ConsumerId;

/// Last nonce handed out by this process.
static LAST_NONCE: AtomicI64 = AtomicI64::new(0);

/// Returns the next contract number for a consumer: `C-{consumer}-{nonce}`.
///
/// The nonce is the current wall-clock time in nanoseconds, bumped past the
/// previous nonce when two calls land in the same tick, so numbers from one
/// process are strictly increasing and never collide. The ledger's unique
/// index on `contract_no` backstops collisions across processes.
pub fn next_contract_no(consumer: ConsumerId) -> String {
    let now = Utc::now().timestamp_nanos_opt().unwrap_or(0);
    let prev = LAST_NONCE
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(0);

    format!("C-{}-{}", consumer, now.max(prev + 1))
}
