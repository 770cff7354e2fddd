//! Testnet faucet client.
//!
//! Tops up the demo wallet's native balance before NFT operations. The faucet
//! is any HTTP endpoint accepting `POST {address, network, asset}` and
//! answering with an optional transaction hash.

use alloy::primitives::{Address, B256};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Source of testnet funds.
#[async_trait]
pub trait Faucet: Send + Sync {
    /// Request funds for `address` on `network`. `asset` defaults to the
    /// network's native token. Returns the funding transaction hash when the
    /// faucet reports one.
    async fn request_funds(
        &self,
        address: Address,
        network: &str,
        asset: Option<&str>,
    ) -> Result<Option<B256>>;
}

#[derive(Debug, Serialize)]
struct FaucetRequest<'a> {
    address: String,
    network: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    asset: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FaucetResponse {
    #[serde(default, alias = "txHash", alias = "transaction_hash")]
    transaction_hash: Option<String>,
}

/// HTTP faucet client.
#[derive(Clone)]
pub struct FaucetClient {
    client: reqwest::Client,
    url: String,
}

impl std::fmt::Debug for FaucetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaucetClient").field("url", &self.url).finish()
    }
}

impl FaucetClient {
    /// Create a client for the faucet at `url`.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Faucet for FaucetClient {
    #[instrument(skip(self), fields(address = %address))]
    async fn request_funds(
        &self,
        address: Address,
        network: &str,
        asset: Option<&str>,
    ) -> Result<Option<B256>> {
        let body = FaucetRequest {
            address: address.to_checksum(None),
            network,
            asset,
        };
        debug!(url = %self.url, network = network, "Requesting faucet funds");

        let response = self.client.post(&self.url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Faucet error: {} - {}", status, body);
        }

        let parsed: FaucetResponse = response.json().await?;
        let tx_hash = parsed
            .transaction_hash
            .map(|h| h.parse::<B256>())
            .transpose()?;

        info!(network = network, tx_hash = ?tx_hash, "Faucet funds requested");
        Ok(tx_hash)
    }
}
