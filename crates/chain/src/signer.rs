//! Transaction signing and submission.
//! Uses Alloy providers for type-safe RPC interactions.
//!
//! The wallet is the only component holding key material. Everything that
//! mutates chain state goes through [`TransactionSubmitter`]; every
//! submission blocks until the receipt is in.

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use anyhow::Context;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Why a submission did not produce a confirmed transaction.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The wallet could not be brought up (initial nonce sync failed).
    #[error("wallet unavailable: {0}")]
    Unavailable(String),

    /// The node refused the transaction.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// Submitted, but no receipt could be obtained.
    #[error("confirmation failed for {tx_hash}: {reason}")]
    Confirmation { tx_hash: B256, reason: String },

    /// Mined with status 0.
    #[error("transaction reverted: {0}")]
    Reverted(B256),
}

/// Mutating transaction-submission capability.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Address transactions are sent from.
    fn address(&self) -> Address;

    /// Sign and send a call to `to`, wait for it to be mined and return its
    /// hash. A reverted receipt is an error.
    async fn submit(&self, to: Address, input: Bytes) -> Result<B256, WalletError>;
}

/// Cached nonce manager.
/// Avoids an RPC round-trip per transaction and keeps concurrent requests
/// from reusing the same nonce.
#[derive(Debug)]
pub struct NonceManager {
    /// Next nonce to hand out (atomically incremented)
    current: AtomicU64,
}

impl NonceManager {
    /// Create new nonce manager with an initial value.
    pub fn new(initial_nonce: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_nonce),
        }
    }

    /// Get next nonce and increment counter.
    #[inline]
    pub fn next(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst)
    }

    /// Get current nonce without incrementing.
    #[inline]
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Catch up with the chain's transaction count; never moves backwards,
    /// so nonces already handed to in-flight submissions stay reserved.
    pub fn sync(&self, chain_nonce: u64) {
        self.current.fetch_max(chain_nonce, Ordering::SeqCst);
    }

    /// Force the nonce to the chain's value. Only valid when the last
    /// handed-out nonce never reached the mempool.
    pub fn reset(&self, chain_nonce: u64) {
        self.current.store(chain_nonce, Ordering::SeqCst);
    }
}

/// Wallet backed by a local secp256k1 key.
pub struct LocalWallet {
    /// RPC URL for sending transactions
    rpc_url: Url,
    /// Signer wallet
    wallet: EthereumWallet,
    /// Signer address
    address: Address,
    /// Chain ID
    chain_id: u64,
    /// Cached nonce manager
    nonce_manager: NonceManager,
    /// Set once the nonce has been read from chain
    ready: OnceCell<()>,
}

impl LocalWallet {
    /// Create a wallet from a hex private key (with or without 0x prefix).
    ///
    /// Key parsing happens here so a bad key fails at startup; the chain is
    /// not contacted until the first submission.
    pub fn new(private_key: &str, rpc_url: &str, chain_id: u64) -> anyhow::Result<Self> {
        let key_str = private_key.trim().trim_start_matches("0x");
        let signer: PrivateKeySigner = key_str.parse().context("Invalid wallet private key")?;
        let address = signer.address();
        let rpc_url: Url = rpc_url
            .parse()
            .with_context(|| format!("Invalid RPC URL: {rpc_url}"))?;

        info!(address = %address, chain_id = chain_id, "Wallet loaded");

        Ok(Self {
            rpc_url,
            wallet: EthereumWallet::from(signer),
            address,
            chain_id,
            nonce_manager: NonceManager::new(0),
            ready: OnceCell::new(),
        })
    }

    /// Read the pending nonce from chain once.
    async fn ensure_ready(&self) -> Result<(), WalletError> {
        self.ready
            .get_or_try_init(|| async {
                let provider = ProviderBuilder::new().on_http(self.rpc_url.clone());
                let nonce = provider
                    .get_transaction_count(self.address)
                    .await
                    .map_err(|e| WalletError::Unavailable(e.to_string()))?;
                self.nonce_manager.reset(nonce);
                info!(address = %self.address, nonce = nonce, "Wallet nonce synced");
                Ok::<(), WalletError>(())
            })
            .await
            .map(|_| ())
    }

    async fn chain_nonce(&self) -> Option<u64> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.clone());
        match provider.get_transaction_count(self.address).await {
            Ok(nonce) => Some(nonce),
            Err(e) => {
                warn!(error = %e, "Failed to read nonce from chain");
                None
            }
        }
    }

    /// The node refused the transaction, so its nonce is free again.
    async fn resync_after_rejection(&self) {
        if let Some(chain_nonce) = self.chain_nonce().await {
            self.nonce_manager.reset(chain_nonce);
            debug!(nonce = chain_nonce, "Nonce reset from chain");
        }
    }

    /// A mined transaction (reverted or not) consumed its nonce.
    async fn resync_after_revert(&self) {
        if let Some(chain_nonce) = self.chain_nonce().await {
            self.nonce_manager.sync(chain_nonce);
            debug!(
                chain = chain_nonce,
                next = self.nonce_manager.current(),
                "Nonce synced from chain"
            );
        }
    }

    /// Chain the wallet signs for.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

#[async_trait]
impl TransactionSubmitter for LocalWallet {
    fn address(&self) -> Address {
        self.address
    }

    async fn submit(&self, to: Address, input: Bytes) -> Result<B256, WalletError> {
        self.ensure_ready().await?;

        let total_start = Instant::now();
        let nonce = self.nonce_manager.next();

        // Gas limit and fees are filled in by the provider's recommended fillers.
        let tx = TransactionRequest::default()
            .with_from(self.address)
            .with_to(to)
            .with_input(input)
            .with_nonce(nonce)
            .with_chain_id(self.chain_id);

        info!(to = %to, nonce = nonce, chain_id = self.chain_id, "Sending transaction");

        let provider = ProviderBuilder::new()
            .wallet(self.wallet.clone())
            .on_http(self.rpc_url.clone());

        let pending = match provider.send_transaction(tx).await {
            Ok(pending) => pending,
            Err(e) => {
                warn!(to = %to, nonce = nonce, error = %e, "Transaction rejected, syncing nonce");
                self.resync_after_rejection().await;
                return Err(WalletError::Rejected(e.to_string()));
            }
        };
        let tx_hash = *pending.tx_hash();

        info!(tx_hash = %tx_hash, "Transaction submitted, waiting for confirmation");

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| WalletError::Confirmation { tx_hash, reason: e.to_string() })?;

        if receipt.status() {
            info!(
                tx_hash = %tx_hash,
                block = receipt.block_number.unwrap_or(0),
                gas_used = receipt.gas_used,
                total_ms = total_start.elapsed().as_millis(),
                "Transaction confirmed"
            );
            Ok(tx_hash)
        } else {
            warn!(
                tx_hash = %tx_hash,
                total_ms = total_start.elapsed().as_millis(),
                "Transaction reverted, syncing nonce"
            );
            self.resync_after_revert().await;
            Err(WalletError::Reverted(tx_hash))
        }
    }
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .field("rpc_url", &self.rpc_url.as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known development key (DO NOT USE IN PRODUCTION)
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_nonce_manager() {
        let manager = NonceManager::new(10);

        assert_eq!(manager.current(), 10);
        assert_eq!(manager.next(), 10);
        assert_eq!(manager.current(), 11);
        assert_eq!(manager.next(), 11);
        assert_eq!(manager.current(), 12);

        // Sync should update if chain is ahead
        manager.sync(15);
        assert_eq!(manager.current(), 15);

        // Sync should not decrease
        manager.sync(10);
        assert_eq!(manager.current(), 15);

        // Reset forces update
        manager.reset(5);
        assert_eq!(manager.current(), 5);
    }

    #[test]
    fn test_sync_after_revert_keeps_in_flight_nonces() {
        let manager = NonceManager::new(5);
        let reverted = manager.next();
        let in_flight = manager.next();
        assert_eq!((reverted, in_flight), (5, 6));

        // Only the reverted transaction has been mined.
        manager.sync(6);
        assert_eq!(manager.next(), 7);
    }

    #[test]
    fn test_wallet_address_from_key() {
        let wallet = LocalWallet::new(DEV_KEY, "https://sepolia.base.org", 84532).unwrap();
        assert_eq!(
            format!("{:?}", wallet.address()).to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert_eq!(wallet.chain_id(), 84532);
    }

    #[test]
    fn test_key_without_prefix() {
        let wallet = LocalWallet::new(DEV_KEY.trim_start_matches("0x"), "https://sepolia.base.org", 84532);
        assert!(wallet.is_ok());
    }

    #[test]
    fn test_invalid_key_rejected() {
        assert!(LocalWallet::new("0x1234", "https://sepolia.base.org", 84532).is_err());
    }

    #[test]
    fn test_debug_hides_key_material() {
        let wallet = LocalWallet::new(DEV_KEY, "https://sepolia.base.org", 84532).unwrap();
        let rendered = format!("{wallet:?}");
        assert!(!rendered.contains("ac0974bec39a17e3"));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_wallet_unavailable() {
        // Nothing listens on port 9 of localhost.
        let wallet = LocalWallet::new(DEV_KEY, "http://127.0.0.1:9", 84532).unwrap();
        let err = wallet.submit(Address::ZERO, Bytes::new()).await.unwrap_err();
        assert!(matches!(err, WalletError::Unavailable(_)));
    }
}
