//! Credit limit endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::Money;
use credit_store::{AssetCatalog, CreditLimit, CreditStore};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::routes::purchases::{AppState, parse_consumer_id};

#[derive(Deserialize)]
pub struct AdjustmentRequest {
    pub amount_cents: i64,
}

#[derive(Serialize)]
pub struct LimitResponse {
    pub consumer_id: String,
    pub tenor_months: u8,
    pub ceiling_cents: i64,
    pub utilized_cents: i64,
    pub available_cents: i64,
}

impl From<CreditLimit> for LimitResponse {
    fn from(l: CreditLimit) -> Self {
        Self {
            consumer_id: l.consumer_id.to_string(),
            tenor_months: l.tenor.months(),
            ceiling_cents: l.ceiling.cents(),
            utilized_cents: l.utilized.cents(),
            available_cents: l.available().cents(),
        }
    }
}

/// POST /consumers/:id/limits/:tenor/adjustments — raise utilization
/// outside a purchase (manual correction, imported balance).
#[tracing::instrument(skip(state, req))]
pub async fn adjust<S: CreditStore + 'static, A: AssetCatalog + 'static>(
    State(state): State<Arc<AppState<S, A>>>,
    Path((id, tenor_months)): Path<(String, u8)>,
    Json(req): Json<AdjustmentRequest>,
) -> Result<Json<LimitResponse>, ApiError> {
    let consumer = parse_consumer_id(&id)?;

    let limit = state
        .credit_service
        .increase_utilization(consumer, tenor_months, Money::from_cents(req.amount_cents))
        .await?;

    Ok(Json(limit.into()))
}
