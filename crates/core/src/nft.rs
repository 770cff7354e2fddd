//! NFT mint, transfer and metadata.

use crate::config::NetworkConfig;
use crate::error::{Result, ServiceError};
use crate::units::{format_units, NATIVE_DECIMALS};
use alloy::primitives::{Address, B256, U256};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use walletkit_api::Faucet;
use walletkit_chain::contracts::{encode_mint, encode_safe_transfer_from};
use walletkit_chain::{ChainReader, TransactionSubmitter};

/// Native balance required before minting: 0.01 ETH.
pub const MINT_MIN_BALANCE: U256 = U256::from_limbs([10_000_000_000_000_000u64, 0, 0, 0]);

/// Native balance required before a transfer: 0.0001 ETH.
pub const TRANSFER_MIN_BALANCE: U256 = U256::from_limbs([100_000_000_000_000u64, 0, 0, 0]);

const BUILTIN_CATALOG: &[&str] = &[
    "A robot painting a sunset over the ocean",
    "A cat astronaut floating above the moon",
    "A neon city skyline in the rain",
    "A dragon made of autumn leaves",
    "A lighthouse on a floating island",
    "A fox reading a book under a tree",
    "A steampunk airship at dawn",
    "A whale swimming through the clouds",
];

/// 1-indexed list of token names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftCatalog {
    entries: Vec<String>,
}

impl NftCatalog {
    pub fn builtin() -> Self {
        Self::new(BUILTIN_CATALOG.iter().map(|s| s.to_string()).collect())
    }

    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    /// Load a TOML catalog: `entries = ["...", "..."]`.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read NFT catalog {}", path.display()))?;
        let catalog: NftCatalog = toml::from_str(&content)
            .with_context(|| format!("Invalid NFT catalog {}", path.display()))?;
        if catalog.is_empty() {
            anyhow::bail!("NFT catalog {} has no entries", path.display());
        }
        Ok(catalog)
    }

    /// Entry for a 1-based token id.
    pub fn get(&self, id: usize) -> Option<&str> {
        id.checked_sub(1)
            .and_then(|idx| self.entries.get(idx))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Metadata document for `id`, with the image served under `base_url`.
    pub fn metadata(&self, id: usize, base_url: &str) -> Result<NftMetadata> {
        let entry = self
            .get(id)
            .ok_or_else(|| ServiceError::validation("Invalid ID"))?;
        Ok(NftMetadata {
            name: entry.to_string(),
            description: entry.to_string(),
            image: format!("{}/images/{}.png", base_url.trim_end_matches('/'), id),
        })
    }
}

/// ERC-1155 metadata JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
}

/// Token id from a metadata path segment such as `3.json`.
///
/// Accepts a decimal id or the 64-digit hex form wallets substitute for
/// `{id}` in ERC-1155 URIs.
pub fn parse_metadata_slug(slug: &str) -> Result<usize> {
    let stem = slug
        .strip_suffix(".json")
        .ok_or_else(|| ServiceError::validation("Invalid route"))?;

    let id = if stem.len() == 64 && stem.bytes().all(|b| b.is_ascii_hexdigit()) {
        usize::from_str_radix(stem.trim_start_matches('0'), 16).ok()
    } else if !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit()) {
        stem.parse::<usize>().ok()
    } else {
        None
    };

    id.ok_or_else(|| ServiceError::validation("Invalid ID"))
}

/// Token id from a JSON number or decimal string.
pub fn parse_token_id(value: &Value) -> Result<U256> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().map(U256::from),
        Value::String(s) => U256::from_str_radix(s.trim(), 10).ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ServiceError::validation(format!("Invalid token ID {value}")))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintResult {
    pub contract_address: Address,
    pub mint_tx_hash: B256,
    pub mint_tx_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    pub tx_hash: B256,
    pub tx_url: String,
}

/// Mints and transfers tokens with the service wallet.
pub struct NftService {
    reader: Arc<dyn ChainReader>,
    wallet: Arc<dyn TransactionSubmitter>,
    faucet: Option<Arc<dyn Faucet>>,
    network: NetworkConfig,
    contract: Option<Address>,
}

impl NftService {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        wallet: Arc<dyn TransactionSubmitter>,
        network: NetworkConfig,
        contract: Option<Address>,
    ) -> Self {
        Self {
            reader,
            wallet,
            faucet: None,
            network,
            contract,
        }
    }

    /// Enable auto-funding from a faucet.
    pub fn with_faucet(mut self, faucet: Arc<dyn Faucet>) -> Self {
        self.faucet = Some(faucet);
        self
    }

    /// Request faucet funds when the wallet holds less than `min_balance`.
    pub async fn ensure_gas(&self, min_balance: U256) -> Result<()> {
        let address = self.wallet.address();
        let balance = self.reader.native_balance(address).await.map_err(|e| {
            warn!(address = %address, error = %e, "Balance check failed");
            ServiceError::Nft(format!("Failed to read wallet balance: {e:#}"))
        })?;
        debug!(
            address = %address,
            balance = %format_units(balance, NATIVE_DECIMALS),
            required = %format_units(min_balance, NATIVE_DECIMALS),
            "Wallet balance"
        );

        if balance >= min_balance {
            return Ok(());
        }

        let Some(faucet) = &self.faucet else {
            warn!(
                address = %address,
                balance = %format_units(balance, NATIVE_DECIMALS),
                "Low balance and no faucet configured"
            );
            return Ok(());
        };

        info!(address = %address, network = %self.network.id, "Funding wallet from faucet");
        faucet
            .request_funds(address, &self.network.id, None)
            .await
            .map_err(|e| {
                warn!(address = %address, error = %e, "Faucet request failed");
                ServiceError::Nft(format!("Failed to fund wallet: {e:#}"))
            })?;
        Ok(())
    }

    /// Mint one `token_id` to the service wallet.
    pub async fn mint(&self, network_id: &str, token_id: U256) -> Result<MintResult> {
        if network_id != self.network.id {
            return Err(ServiceError::validation(format!(
                "Unsupported network '{}' (wallet is on '{}')",
                network_id, self.network.id
            )));
        }
        let contract = self
            .contract
            .ok_or_else(|| ServiceError::Nft("NFT contract address is not configured".into()))?;

        self.ensure_gas(MINT_MIN_BALANCE).await?;

        let owner = self.wallet.address();
        info!(contract = %contract, to = %owner, token_id = %token_id, "Minting NFT");

        let tx_hash = self
            .wallet
            .submit(contract, encode_mint(owner, token_id, U256::from(1u64)))
            .await
            .map_err(|e| {
                warn!(contract = %contract, error = %e, "Mint failed");
                ServiceError::Nft(format!("Failed to mint NFT: {e}"))
            })?;

        info!(tx_hash = %tx_hash, "Mint confirmed");
        Ok(MintResult {
            contract_address: contract,
            mint_tx_hash: tx_hash,
            mint_tx_url: self.network.tx_url(tx_hash).unwrap_or_default(),
        })
    }

    /// Transfer one `token_id` from the service wallet to `to`.
    pub async fn transfer(&self, nft: Address, to: Address, token_id: U256) -> Result<TransferResult> {
        self.ensure_gas(TRANSFER_MIN_BALANCE).await?;

        let owner = self.wallet.address();
        info!(contract = %nft, from = %owner, to = %to, token_id = %token_id, "Transferring NFT");

        let tx_hash = self
            .wallet
            .submit(nft, encode_safe_transfer_from(owner, to, token_id, U256::from(1u64)))
            .await
            .map_err(|e| {
                warn!(contract = %nft, error = %e, "Transfer failed");
                ServiceError::Nft(format!("Failed to transfer NFT: {e}"))
            })?;

        info!(tx_hash = %tx_hash, "Transfer confirmed");
        Ok(TransferResult {
            tx_hash,
            tx_url: self.network.tx_url(tx_hash).unwrap_or_default(),
        })
    }
}
