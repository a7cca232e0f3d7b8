//! Purchase and history endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::ConsumerId;
use credit_store::{AssetCatalog, AssetId, CreditStore, PurchaseRecord};
use domain::CreditService;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: CreditStore, A: AssetCatalog> {
    pub credit_service: CreditService<S, A>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct PurchaseRequest {
    pub asset_id: String,
    pub tenor_months: u8,
}

// -- Response types --

#[derive(Serialize)]
pub struct PurchaseResponse {
    pub contract_no: String,
    pub consumer_id: String,
    pub asset_id: String,
    pub tenor_months: u8,
    pub principal_cents: i64,
    pub fee_cents: i64,
    pub interest_cents: i64,
    pub installment_cents: i64,
    pub total_cents: i64,
}

#[derive(Serialize)]
pub struct PurchaseRecordResponse {
    pub contract_no: String,
    pub asset_id: String,
    pub tenor_months: u8,
    pub principal_cents: i64,
    pub fee_cents: i64,
    pub interest_cents: i64,
    pub installment_cents: i64,
    pub outcome: String,
    pub created_at: String,
}

impl From<PurchaseRecord> for PurchaseRecordResponse {
    fn from(r: PurchaseRecord) -> Self {
        Self {
            contract_no: r.contract_no,
            asset_id: r.asset_id.to_string(),
            tenor_months: r.tenor.months(),
            principal_cents: r.principal.cents(),
            fee_cents: r.fee.cents(),
            interest_cents: r.interest.cents(),
            installment_cents: r.installment.cents(),
            outcome: r.outcome.to_string(),
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

// -- Handlers --

/// POST /consumers/:id/purchases — attempt a purchase on credit.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: CreditStore + 'static, A: AssetCatalog + 'static>(
    State(state): State<Arc<AppState<S, A>>>,
    Path(id): Path<String>,
    Json(req): Json<PurchaseRequest>,
) -> Result<(axum::http::StatusCode, Json<PurchaseResponse>), ApiError> {
    let consumer = parse_consumer_id(&id)?;
    let asset = parse_asset_id(&req.asset_id)?;

    let approval = state
        .credit_service
        .purchase(consumer, asset, req.tenor_months)
        .await?;

    let response = PurchaseResponse {
        contract_no: approval.contract_no,
        consumer_id: approval.consumer_id.to_string(),
        asset_id: approval.asset_id.to_string(),
        tenor_months: approval.tenor.months(),
        principal_cents: approval.terms.principal.cents(),
        fee_cents: approval.terms.fee.cents(),
        interest_cents: approval.terms.interest.cents(),
        installment_cents: approval.terms.installment.cents(),
        total_cents: approval.terms.total().cents(),
    };

    Ok((axum::http::StatusCode::CREATED, Json(response)))
}

/// GET /consumers/:id/purchases — the consumer's attempt history, most
/// recent first. Includes declined attempts.
#[tracing::instrument(skip(state))]
pub async fn list<S: CreditStore + 'static, A: AssetCatalog + 'static>(
    State(state): State<Arc<AppState<S, A>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PurchaseRecordResponse>>, ApiError> {
    let consumer = parse_consumer_id(&id)?;

    let records = state.credit_service.list_purchases(consumer).await?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}

pub(crate) fn parse_consumer_id(id: &str) -> Result<ConsumerId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid consumer id: {e}")))?;
    Ok(ConsumerId::from(uuid))
}

fn parse_asset_id(id: &str) -> Result<AssetId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid asset id: {e}")))?;
    Ok(AssetId::from(uuid))
}
