//! HTTP surface of the wallet service.

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use walletkit_chain::{ChainReader, TransactionSubmitter};
use walletkit_core::{AccountReader, ActionDispatcher, ContractReadService, NftCatalog, NftService};

pub use error::ApiError;

/// Shared handler state. Built once in `main`.
pub struct AppState {
    /// Reader for the wallet's network
    pub chain: Arc<dyn ChainReader>,
    pub wallet: Arc<dyn TransactionSubmitter>,
    pub accounts: AccountReader,
    pub dispatcher: ActionDispatcher,
    pub contract_reader: ContractReadService,
    pub nft: NftService,
    pub catalog: NftCatalog,
    /// Base URL for NFT images; derived from request headers when unset
    pub public_base_url: Option<String>,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::aave::router())
        .merge(routes::contract_reader::router())
        .merge(routes::nft::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
