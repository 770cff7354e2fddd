//! Lending action dispatcher.
//!
//! Supply and repay move the asset into the pool, so they approve the pool
//! first and only send the action once the approval has confirmed. Borrow and
//! withdraw are a single pool call.

use crate::config::NetworkConfig;
use crate::error::{ActionError, Result, ServiceError};
use crate::units::{parse_units, USDC_DECIMALS};
use alloy::primitives::{Address, Bytes, B256, U256};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use walletkit_chain::contracts::{
    encode_approve, encode_borrow, encode_repay, encode_supply, encode_withdraw,
};
use walletkit_chain::TransactionSubmitter;

/// Mutating pool action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LendingAction {
    Supply,
    Borrow,
    Repay,
    Withdraw,
}

/// Unrecognized action discriminator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for LendingAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "supply" => Ok(LendingAction::Supply),
            "borrow" => Ok(LendingAction::Borrow),
            "repay" => Ok(LendingAction::Repay),
            "withdraw" => Ok(LendingAction::Withdraw),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for LendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LendingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LendingAction::Supply => "supply",
            LendingAction::Borrow => "borrow",
            LendingAction::Repay => "repay",
            LendingAction::Withdraw => "withdraw",
        }
    }

    /// Whether the pool must be approved to pull the asset first.
    pub fn needs_approval(&self) -> bool {
        matches!(self, LendingAction::Supply | LendingAction::Repay)
    }

    /// Error message for a failed action.
    pub fn failure_message(&self) -> &'static str {
        match self {
            LendingAction::Supply => "Failed to supply assets",
            LendingAction::Borrow => "Failed to borrow",
            LendingAction::Repay => "Failed to repay",
            LendingAction::Withdraw => "Failed to withdraw",
        }
    }

    fn calldata(&self, asset: Address, amount: U256, owner: Address) -> Bytes {
        match self {
            LendingAction::Supply => encode_supply(asset, amount, owner),
            LendingAction::Borrow => encode_borrow(asset, amount, owner),
            LendingAction::Repay => encode_repay(asset, amount, owner),
            LendingAction::Withdraw => encode_withdraw(asset, amount, owner),
        }
    }
}

/// Pool and asset the dispatcher operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LendingMarket {
    pub pool: Address,
    pub asset: Address,
    pub decimals: u8,
}

impl LendingMarket {
    /// USDC market (6 decimals).
    pub fn usdc(pool: Address, usdc: Address) -> Self {
        Self {
            pool,
            asset: usdc,
            decimals: USDC_DECIMALS,
        }
    }
}

/// Confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    pub tx_hash: B256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_url: Option<String>,
}

impl TransactionResult {
    pub fn new(tx_hash: B256, network: &NetworkConfig) -> Self {
        Self {
            tx_hash,
            tx_url: network.tx_url(tx_hash),
        }
    }
}

/// Executes lending actions with the service wallet.
pub struct ActionDispatcher {
    wallet: Arc<dyn TransactionSubmitter>,
    market: LendingMarket,
    network: NetworkConfig,
}

impl ActionDispatcher {
    pub fn new(
        wallet: Arc<dyn TransactionSubmitter>,
        market: LendingMarket,
        network: NetworkConfig,
    ) -> Self {
        Self {
            wallet,
            market,
            network,
        }
    }

    /// Parse a decimal amount in the market asset's units. Zero is rejected.
    pub fn parse_amount(&self, amount: &str) -> Result<U256> {
        let value = parse_units(amount, self.market.decimals)
            .map_err(|e| ServiceError::validation(format!("Invalid amount: {e}")))?;
        if value.is_zero() {
            return Err(ServiceError::validation("Invalid amount: must be greater than zero"));
        }
        Ok(value)
    }

    /// Run `action` for `amount` and return the confirmed action transaction.
    pub async fn execute(&self, action: LendingAction, amount: &str) -> Result<TransactionResult> {
        let value = self.parse_amount(amount)?;
        let owner = self.wallet.address();

        info!(
            action = %action,
            amount = %amount,
            raw_amount = %value,
            owner = %owner,
            "Executing lending action"
        );

        if action.needs_approval() {
            let approve_hash = self
                .wallet
                .submit(self.market.asset, encode_approve(self.market.pool, value))
                .await
                .map_err(|e| {
                    warn!(action = %action, error = %e, "Approval failed");
                    ServiceError::action(action, ActionError::Approval(e))
                })?;
            debug!(action = %action, tx_hash = %approve_hash, "Pool approved");
        }

        let calldata = action.calldata(self.market.asset, value, owner);
        let tx_hash = self
            .wallet
            .submit(self.market.pool, calldata)
            .await
            .map_err(|e| {
                warn!(action = %action, error = %e, "Action failed");
                ServiceError::action(action, ActionError::Submission(e))
            })?;

        info!(action = %action, tx_hash = %tx_hash, "Lending action confirmed");
        Ok(TransactionResult::new(tx_hash, &self.network))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkRegistry;
    use crate::testing::MockWallet;
    use alloy::sol_types::SolCall;
    use walletkit_chain::contracts::aave_v3::IPool;
    use walletkit_chain::contracts::common::IERC20;

    const POOL: Address = Address::repeat_byte(0xaa);
    const USDC: Address = Address::repeat_byte(0xbb);
    const OWNER: Address = Address::repeat_byte(0x01);

    fn dispatcher(wallet: Arc<MockWallet>) -> ActionDispatcher {
        let network = NetworkRegistry::builtin().get("base-sepolia").cloned().unwrap();
        ActionDispatcher::new(wallet, LendingMarket::usdc(POOL, USDC), network)
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("supply".parse::<LendingAction>().unwrap(), LendingAction::Supply);
        assert_eq!("withdraw".parse::<LendingAction>().unwrap(), LendingAction::Withdraw);
        assert!("Supply".parse::<LendingAction>().is_err());
        assert!("liquidate".parse::<LendingAction>().is_err());
        assert_eq!(LendingAction::Repay.to_string(), "repay");
        assert!(LendingAction::Repay.needs_approval());
        assert!(!LendingAction::Borrow.needs_approval());
    }

    #[tokio::test]
    async fn test_supply_approves_then_supplies() {
        let wallet = Arc::new(MockWallet::new(OWNER));
        let result = dispatcher(wallet.clone())
            .execute(LendingAction::Supply, "100")
            .await
            .unwrap();

        let submitted = wallet.submitted();
        assert_eq!(submitted.len(), 2);

        let (to, input) = &submitted[0];
        assert_eq!(*to, USDC);
        let approve = IERC20::approveCall::abi_decode(input, true).unwrap();
        assert_eq!(approve.spender, POOL);
        assert_eq!(approve.amount, U256::from(100_000_000u64));

        let (to, input) = &submitted[1];
        assert_eq!(*to, POOL);
        let supply = IPool::supplyCall::abi_decode(input, true).unwrap();
        assert_eq!(supply.asset, USDC);
        assert_eq!(supply.amount, U256::from(100_000_000u64));
        assert_eq!(supply.onBehalfOf, OWNER);
        assert_eq!(supply.referralCode, 0);

        // Action hash, not the approval hash
        assert_eq!(result.tx_hash, B256::with_last_byte(2));
        assert!(result.tx_url.unwrap().starts_with("https://sepolia.basescan.org/tx/0x"));
    }

    #[tokio::test]
    async fn test_failed_approval_skips_action() {
        let wallet = Arc::new(MockWallet::new(OWNER));
        wallet.revert_on(USDC);

        let err = dispatcher(wallet.clone())
            .execute(LendingAction::Supply, "1")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Action {
                action: LendingAction::Supply,
                source: ActionError::Approval(_)
            }
        ));
        assert!(wallet.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_repay_approves_then_repays() {
        let wallet = Arc::new(MockWallet::new(OWNER));
        dispatcher(wallet.clone())
            .execute(LendingAction::Repay, "2.5")
            .await
            .unwrap();

        let submitted = wallet.submitted();
        assert_eq!(submitted.len(), 2);
        assert_eq!(submitted[0].0, USDC);
        let repay = IPool::repayCall::abi_decode(&submitted[1].1, true).unwrap();
        assert_eq!(repay.amount, U256::from(2_500_000u64));
        assert_eq!(repay.interestRateMode, U256::from(2u64));
        assert_eq!(repay.onBehalfOf, OWNER);
    }

    #[tokio::test]
    async fn test_borrow_is_single_call() {
        let wallet = Arc::new(MockWallet::new(OWNER));
        let result = dispatcher(wallet.clone())
            .execute(LendingAction::Borrow, "10")
            .await
            .unwrap();

        let submitted = wallet.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].0, POOL);
        let borrow = IPool::borrowCall::abi_decode(&submitted[0].1, true).unwrap();
        assert_eq!(borrow.amount, U256::from(10_000_000u64));
        assert_eq!(borrow.interestRateMode, U256::from(2u64));
        assert_eq!(borrow.referralCode, 0);
        assert_eq!(borrow.onBehalfOf, OWNER);
        assert_eq!(result.tx_hash, B256::with_last_byte(1));
    }

    #[tokio::test]
    async fn test_withdraw_to_self() {
        let wallet = Arc::new(MockWallet::new(OWNER));
        dispatcher(wallet.clone())
            .execute(LendingAction::Withdraw, "0.000001")
            .await
            .unwrap();

        let withdraw = IPool::withdrawCall::abi_decode(&wallet.submitted()[0].1, true).unwrap();
        assert_eq!(withdraw.amount, U256::from(1u64));
        assert_eq!(withdraw.to, OWNER);
    }

    #[tokio::test]
    async fn test_reverted_action_is_submission_error() {
        let wallet = Arc::new(MockWallet::new(OWNER));
        wallet.revert_on(POOL);

        let err = dispatcher(wallet.clone())
            .execute(LendingAction::Supply, "1")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Action {
                source: ActionError::Submission(_),
                ..
            }
        ));
        // Approval stays confirmed
        assert_eq!(wallet.submitted().len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_wallet() {
        let wallet = Arc::new(MockWallet::new(OWNER));
        wallet.unavailable_on(POOL);

        let err = dispatcher(wallet)
            .execute(LendingAction::Borrow, "1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::WalletImport(_)));
    }

    #[tokio::test]
    async fn test_invalid_amounts_are_validation_errors() {
        let wallet = Arc::new(MockWallet::new(OWNER));
        let dispatcher = dispatcher(wallet.clone());

        for amount in ["", "abc", "0", "0.0", "1.0000001", "-5"] {
            let err = dispatcher.execute(LendingAction::Supply, amount).await.unwrap_err();
            assert_eq!(err.status_code(), 400, "amount {amount:?}");
        }
        assert!(wallet.submitted().is_empty());
    }
}
