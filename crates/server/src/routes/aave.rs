//! `/api/aave`: account snapshot and lending actions.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

use alloy::primitives::B256;
use walletkit_core::{AccountSnapshot, LendingAction};

use crate::{ApiError, AppState};

const GET_ACCOUNT_DATA: &str = "getUserAccountData";

#[derive(Debug, Deserialize)]
pub struct AaveQuery {
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AaveRequest {
    pub action: Option<String>,
    /// Decimal string; JSON numbers are accepted too
    pub amount: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub tx_hash: B256,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/aave", get(account_data).post(lending_action))
}

async fn account_data(
    State(state): State<Arc<AppState>>,
    query: Result<Query<AaveQuery>, QueryRejection>,
) -> Result<Json<AccountSnapshot>, ApiError> {
    let Query(query) = query?;
    if query.action.as_deref() != Some(GET_ACCOUNT_DATA) {
        return Err(ApiError::invalid_action());
    }

    let wallet = state.wallet.address();
    let snapshot = state.accounts.snapshot(wallet).await.map_err(|e| {
        error!(wallet = %wallet, error = %e, "Failed to get user account data");
        ApiError::with_context(e, "Failed to fetch account data")
    })?;

    Ok(Json(snapshot))
}

async fn lending_action(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AaveRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, ApiError> {
    let Json(request) = body?;

    let action: LendingAction = request
        .action
        .as_deref()
        .and_then(|a| a.parse().ok())
        .ok_or_else(ApiError::invalid_action)?;

    let amount = match request.amount {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(ApiError::bad_request("Amount is required")),
    };

    debug!(action = %action, amount = %amount, "Lending request");

    let result = state
        .dispatcher
        .execute(action, &amount)
        .await
        .map_err(|e| {
            error!(action = %action, error = %e, "Lending action failed");
            ApiError::with_context(e, action.failure_message())
        })?;

    let success = match action {
        LendingAction::Supply => None,
        _ => Some(true),
    };
    Ok(Json(ActionResponse {
        success,
        tx_hash: result.tx_hash,
    }))
}
