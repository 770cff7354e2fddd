//! NFT mint, transfer and metadata.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use alloy::primitives::Address;
use walletkit_core::{
    parse_metadata_slug, parse_token_id, MintResult, NftMetadata, TransferResult,
};

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRequest {
    pub network_id: Option<String>,
    #[serde(default)]
    pub token_id: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub nft_address: Option<String>,
    pub to_address: Option<String>,
    #[serde(default)]
    pub token_id: Value,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/mint", post(mint))
        .route("/api/transfer", post(transfer))
        .route("/api/nft/{slug}", get(metadata))
}

async fn mint(
    State(state): State<Arc<AppState>>,
    body: Result<Json<MintRequest>, JsonRejection>,
) -> Result<Json<MintResult>, ApiError> {
    let Json(request) = body?;

    let Some(network_id) = request.network_id else {
        error!("Network ID is missing in the request");
        return Err(ApiError::bad_request("Network ID is required"));
    };
    let token_id = parse_token_id(&request.token_id)?;
    info!(network = %network_id, token_id = %token_id, "Mint request");

    let result = state.nft.mint(&network_id, token_id).await.map_err(|e| {
        error!(error = %e, "Error during minting process");
        ApiError::with_context(e, "Failed to mint NFT")
    })?;

    Ok(Json(result))
}

async fn transfer(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Json<TransferResult>, ApiError> {
    let Json(request) = body?;

    let (Some(nft_address), Some(to_address)) = (
        request.nft_address.filter(|s| !s.is_empty()),
        request.to_address.filter(|s| !s.is_empty()),
    ) else {
        return Err(missing_transfer_fields());
    };
    if request.token_id.is_null() {
        return Err(missing_transfer_fields());
    }

    let nft: Address = nft_address
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid NFT address '{nft_address}'")))?;
    let to: Address = to_address
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid recipient address '{to_address}'")))?;
    let token_id = parse_token_id(&request.token_id)?;

    let result = state.nft.transfer(nft, to, token_id).await.map_err(|e| {
        error!(error = %e, "Error during NFT transfer process");
        ApiError::with_context(e, "Failed to transfer NFT")
    })?;

    Ok(Json(result))
}

fn missing_transfer_fields() -> ApiError {
    ApiError::bad_request("NFT address, recipient address, and token ID are required")
}

async fn metadata(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Json<NftMetadata>, ApiError> {
    let id = parse_metadata_slug(&slug)?;
    let base_url = match &state.public_base_url {
        Some(url) => url.clone(),
        None => base_url_from_headers(&headers),
    };
    Ok(Json(state.catalog.metadata(id, &base_url)?))
}

fn base_url_from_headers(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    };
    let proto = match header("x-forwarded-proto") {
        "" => "http",
        proto => proto,
    };
    format!("{}://{}", proto, header("host"))
}
