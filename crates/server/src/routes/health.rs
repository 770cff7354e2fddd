use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

/// Reports whether the wallet network's RPC endpoint answers.
async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match state.chain.block_number().await {
        Ok(block) => (
            StatusCode::OK,
            Json(json!({"status": "ok", "blockNumber": block})),
        ),
        Err(e) => {
            warn!(error = %e, "RPC health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "unavailable", "error": e.to_string()})),
            )
        }
    }
}
