//! Wallet SDK demo service
//!
//! HTTP service exposing wallet-driven on-chain actions:
//! - Aave V3 account snapshot and supply/borrow/repay/withdraw
//! - ABI-driven read-only contract calls on any configured network
//! - ERC-1155 mint, transfer and metadata

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use walletkit_api::FaucetClient;
use walletkit_chain::{ChainReader, LocalWallet, RpcReader, TransactionSubmitter};
use walletkit_core::config::env;
use walletkit_core::{
    AccountReader, ActionDispatcher, ContractReadService, LendingMarket, LogFormat, NftService,
    ServiceConfig,
};
use walletkit_server::{build_router, AppState};

const DEFAULT_LOG_FILTER: &str = "info,walletkit_core=debug,walletkit_chain=debug";

#[tokio::main]
async fn main() -> Result<()> {
    // Print startup banner
    print_banner();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing before config so config errors are logged
    init_tracing(LogFormat::parse(std::env::var(env::LOG_FORMAT).ok().as_deref()));

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    config.log_config();

    let bind_addr = config.bind_addr;
    let state = initialize_components(config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    info!(addr = %bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init(),
    }
}

fn initialize_components(config: ServiceConfig) -> Result<Arc<AppState>> {
    info!("Initializing components...");

    // One read-only provider per known network
    let mut readers: HashMap<String, Arc<dyn ChainReader>> = HashMap::new();
    for network in config.networks.iter() {
        let reader = RpcReader::new(network.id.clone(), &network.rpc_url)
            .with_context(|| format!("Invalid RPC URL for network {}", network.id))?;
        readers.insert(network.id.clone(), Arc::new(reader));
    }

    let network = config.wallet_network()?.clone();
    let wallet_reader = readers
        .get(&network.id)
        .cloned()
        .with_context(|| format!("No reader for network {}", network.id))?;

    // Wallet (the only holder of key material)
    let wallet: Arc<dyn TransactionSubmitter> = Arc::new(
        LocalWallet::new(&config.private_key, &network.rpc_url, network.chain_id)
            .context("Failed to load wallet")?,
    );
    info!(address = %wallet.address(), network = %network.id, "Wallet initialized");

    let contract_reader = readers
        .into_iter()
        .fold(ContractReadService::new(config.network_id.clone()), |service, (id, reader)| {
            service.with_network(id, reader)
        });

    let mut nft = NftService::new(
        wallet_reader.clone(),
        wallet.clone(),
        network.clone(),
        config.nft_contract,
    );
    if let Some(url) = &config.faucet_url {
        nft = nft.with_faucet(Arc::new(FaucetClient::new(url.clone())?));
        info!(url = %url, "Faucet enabled");
    }

    let state = AppState {
        chain: wallet_reader.clone(),
        wallet: wallet.clone(),
        accounts: AccountReader::new(wallet_reader, config.pool_address, config.usdc_address),
        dispatcher: ActionDispatcher::new(
            wallet,
            LendingMarket::usdc(config.pool_address, config.usdc_address),
            network,
        ),
        contract_reader,
        nft,
        catalog: config.nft_catalog,
        public_base_url: config.public_base_url,
    };

    info!("All components initialized");
    Ok(Arc::new(state))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

/// Print startup banner.
fn print_banner() {
    println!(r#"
    ╦ ╦┌─┐┬  ┬  ┌─┐┌┬┐╦╔═┬┌┬┐
    ║║║├─┤│  │  ├┤  │ ╠╩╗│ │
    ╚╩╝┴ ┴┴─┘┴─┘└─┘ ┴ ╩ ╩┴ ┴
    Wallet SDK Demo v0.1.0
    "#);
}
