use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{routing::post, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use walletkit_core::ContractReadRequest;

use crate::{ApiError, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/contractreader", post(read_contract))
}

async fn read_contract(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ContractReadRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body?;

    let result = state.contract_reader.read(request).await.map_err(|e| {
        error!(error = %e, "Error reading contract");
        ApiError::from(e)
    })?;

    Ok(Json(json!({ "result": result })))
}
