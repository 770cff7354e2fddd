//! In-memory chain, wallet and faucet for unit tests.

use alloy::primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use walletkit_api::Faucet;
use walletkit_chain::{ChainReader, TransactionSubmitter, WalletError};

/// Canned `eth_call` responses keyed by target contract.
#[derive(Default)]
pub struct MockChain {
    responses: Mutex<HashMap<Address, Result<Vec<u8>, String>>>,
    balances: Mutex<HashMap<Address, U256>>,
    calls: Mutex<Vec<(Address, Bytes)>>,
}

impl MockChain {
    pub fn respond(&self, to: Address, data: Vec<u8>) {
        self.responses.lock().insert(to, Ok(data));
    }

    pub fn fail(&self, to: Address, reason: &str) {
        self.responses.lock().insert(to, Err(reason.to_string()));
    }

    pub fn set_balance(&self, account: Address, balance: U256) {
        self.balances.lock().insert(account, balance);
    }

    pub fn calls(&self) -> Vec<(Address, Bytes)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn call(&self, to: Address, input: Bytes) -> anyhow::Result<Bytes> {
        self.calls.lock().push((to, input));
        match self.responses.lock().get(&to) {
            Some(Ok(data)) => Ok(Bytes::from(data.clone())),
            Some(Err(reason)) => Err(anyhow::anyhow!("{reason}")),
            None => Err(anyhow::anyhow!("no code at {to}")),
        }
    }

    async fn native_balance(&self, account: Address) -> anyhow::Result<U256> {
        Ok(self.balances.lock().get(&account).copied().unwrap_or_default())
    }

    async fn block_number(&self) -> anyhow::Result<u64> {
        Ok(1)
    }
}

/// Records submissions in order; submissions to a failing target revert.
pub struct MockWallet {
    address: Address,
    submitted: Mutex<Vec<(Address, Bytes)>>,
    failing: Mutex<HashMap<Address, bool>>,
}

impl MockWallet {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            submitted: Mutex::new(Vec::new()),
            failing: Mutex::new(HashMap::new()),
        }
    }

    /// Make every submission to `to` revert.
    pub fn revert_on(&self, to: Address) {
        self.failing.lock().insert(to, true);
    }

    /// Make every submission to `to` fail as if the node were unreachable.
    pub fn unavailable_on(&self, to: Address) {
        self.failing.lock().insert(to, false);
    }

    pub fn submitted(&self) -> Vec<(Address, Bytes)> {
        self.submitted.lock().clone()
    }
}

#[async_trait]
impl TransactionSubmitter for MockWallet {
    fn address(&self) -> Address {
        self.address
    }

    async fn submit(&self, to: Address, input: Bytes) -> Result<B256, WalletError> {
        if let Some(reverts) = self.failing.lock().get(&to).copied() {
            return Err(if reverts {
                WalletError::Reverted(B256::repeat_byte(0xee))
            } else {
                WalletError::Unavailable("connection refused".to_string())
            });
        }
        let mut submitted = self.submitted.lock();
        submitted.push((to, input));
        Ok(B256::with_last_byte(submitted.len() as u8))
    }
}

/// Faucet that credits a fixed amount on a [`MockChain`].
pub struct MockFaucet {
    pub requests: Mutex<Vec<(Address, String)>>,
    pub fails: bool,
}

impl MockFaucet {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fails: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fails: true,
        }
    }
}

#[async_trait]
impl Faucet for MockFaucet {
    async fn request_funds(
        &self,
        address: Address,
        network: &str,
        _asset: Option<&str>,
    ) -> anyhow::Result<Option<B256>> {
        self.requests.lock().push((address, network.to_string()));
        if self.fails {
            anyhow::bail!("faucet limit reached");
        }
        Ok(Some(B256::repeat_byte(0xfa)))
    }
}
