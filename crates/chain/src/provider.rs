//! Read-only chain access.
//! Uses Alloy providers for type-safe RPC interactions.
//!
//! Read paths only ever see a [`ChainReader`]; nothing here can sign.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::http::reqwest::Url;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

/// Read-only chain-query capability.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Execute an `eth_call` against `to` with raw calldata.
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes>;

    /// Native token balance of `account`, in wei.
    async fn native_balance(&self, account: Address) -> Result<U256>;

    /// Latest block number; doubles as a reachability check.
    async fn block_number(&self) -> Result<u64>;
}

/// JSON-RPC backed reader for one network.
#[derive(Debug, Clone)]
pub struct RpcReader {
    /// Network identifier (e.g. "base-sepolia")
    network: String,
    /// HTTP RPC endpoint
    rpc_url: Url,
}

impl RpcReader {
    /// Create a reader for `network` talking to `rpc_url`.
    ///
    /// No connection is made here; the endpoint is only validated.
    pub fn new(network: impl Into<String>, rpc_url: &str) -> Result<Self> {
        let network = network.into();
        let rpc_url: Url = rpc_url
            .parse()
            .with_context(|| format!("Invalid RPC URL for {network}: {rpc_url}"))?;

        info!(network = %network, rpc = %rpc_url, "RPC reader configured");

        Ok(Self { network, rpc_url })
    }

    /// Network identifier this reader serves.
    pub fn network(&self) -> &str {
        &self.network
    }
}

#[async_trait]
impl ChainReader for RpcReader {
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes> {
        debug!(
            network = %self.network,
            to = %to,
            calldata_len = input.len(),
            "eth_call"
        );

        let provider = ProviderBuilder::new().on_http(self.rpc_url.clone());
        let tx = TransactionRequest::default().with_to(to).with_input(input);
        let output = provider
            .call(tx)
            .await
            .with_context(|| format!("eth_call to {to} on {} failed", self.network))?;

        Ok(output)
    }

    async fn native_balance(&self, account: Address) -> Result<U256> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.clone());
        let balance = provider
            .get_balance(account)
            .await
            .with_context(|| format!("eth_getBalance for {account} on {} failed", self.network))?;
        Ok(balance)
    }

    async fn block_number(&self) -> Result<u64> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.clone());
        let block = provider
            .get_block_number()
            .await
            .with_context(|| format!("eth_blockNumber on {} failed", self.network))?;
        debug!(network = %self.network, block = block, "Block number");
        Ok(block)
    }
}
