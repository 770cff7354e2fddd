//! Aave account snapshot.

use crate::error::{Result, ServiceError};
use crate::units::{format_units, BASE_CURRENCY_DECIMALS, HEALTH_FACTOR_DECIMALS, USDC_DECIMALS};
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use walletkit_chain::contracts::{
    decode_balance_of, decode_user_account_data, encode_balance_of, encode_get_user_account_data,
    UserAccountData,
};
use walletkit_chain::ChainReader;

/// Normalized account position, recomputed on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    pub wallet_address: String,
    pub usdc_balance: String,
    /// Total collateral in base currency
    pub total_deposited: String,
    pub total_debt_base: String,
    pub available_borrows_base: String,
    /// Basis points
    pub current_liquidation_threshold: String,
    /// Basis points
    pub ltv: String,
    pub health_factor: String,
}

impl AccountSnapshot {
    /// Build from raw on-chain values.
    pub fn from_raw(wallet: Address, data: &UserAccountData, usdc_balance: U256) -> Self {
        Self {
            wallet_address: wallet.to_checksum(None),
            usdc_balance: format_units(usdc_balance, USDC_DECIMALS),
            total_deposited: format_units(data.total_collateral_base, BASE_CURRENCY_DECIMALS),
            total_debt_base: format_units(data.total_debt_base, BASE_CURRENCY_DECIMALS),
            available_borrows_base: format_units(data.available_borrows_base, BASE_CURRENCY_DECIMALS),
            current_liquidation_threshold: data.current_liquidation_threshold.to_string(),
            ltv: data.ltv.to_string(),
            health_factor: format_units(data.health_factor, HEALTH_FACTOR_DECIMALS),
        }
    }
}

/// Reads the pool position and USDC balance of one wallet.
pub struct AccountReader {
    reader: Arc<dyn ChainReader>,
    pool: Address,
    usdc: Address,
}

impl AccountReader {
    pub fn new(reader: Arc<dyn ChainReader>, pool: Address, usdc: Address) -> Self {
        Self { reader, pool, usdc }
    }

    /// Fetch `getUserAccountData` and `balanceOf` concurrently. Either
    /// failing fails the snapshot.
    pub async fn snapshot(&self, wallet: Address) -> Result<AccountSnapshot> {
        debug!(wallet = %wallet, pool = %self.pool, "Reading account data");

        let account_fut = async {
            let raw = self
                .reader
                .call(self.pool, encode_get_user_account_data(wallet))
                .await?;
            decode_user_account_data(&raw)
        };
        let balance_fut = async {
            let raw = self.reader.call(self.usdc, encode_balance_of(wallet)).await?;
            decode_balance_of(&raw)
        };

        let (data, balance) = tokio::try_join!(account_fut, balance_fut).map_err(|e| {
            warn!(wallet = %wallet, error = %e, "Account read failed");
            ServiceError::Read(format!("{e:#}"))
        })?;

        let snapshot = AccountSnapshot::from_raw(wallet, &data, balance);
        debug!(
            wallet = %wallet,
            deposited = %snapshot.total_deposited,
            debt = %snapshot.total_debt_base,
            health_factor = %snapshot.health_factor,
            "Account data read"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockChain;
    use alloy::sol_types::SolValue;

    fn account_data_bytes() -> Vec<u8> {
        (
            U256::from(123_456_789u64),
            U256::from(50_000_000u64),
            U256::from(25_000_000u64),
            U256::from(8_300u64),
            U256::from(8_000u64),
            U256::from(2_500_000_000_000_000_000u128),
        )
            .abi_encode_params()
    }

    #[tokio::test]
    async fn test_snapshot_normalizes_values() {
        let pool = Address::repeat_byte(0xaa);
        let usdc = Address::repeat_byte(0xbb);
        let wallet = Address::repeat_byte(0x01);

        let chain = Arc::new(MockChain::default());
        chain.respond(pool, account_data_bytes());
        chain.respond(usdc, U256::from(1_500_000u64).abi_encode());

        let reader = AccountReader::new(chain.clone(), pool, usdc);
        let snapshot = reader.snapshot(wallet).await.unwrap();

        assert_eq!(snapshot.total_deposited, "1.23456789");
        assert_eq!(snapshot.total_debt_base, "0.5");
        assert_eq!(snapshot.available_borrows_base, "0.25");
        assert_eq!(snapshot.current_liquidation_threshold, "8300");
        assert_eq!(snapshot.ltv, "8000");
        assert_eq!(snapshot.health_factor, "2.5");
        assert_eq!(snapshot.usdc_balance, "1.5");
        assert_eq!(snapshot.wallet_address, wallet.to_checksum(None));
        assert_eq!(chain.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_snapshot_serializes_camel_case() {
        let snapshot = AccountSnapshot::from_raw(Address::ZERO, &UserAccountData::default(), U256::ZERO);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["totalDeposited"], "0");
        assert_eq!(json["healthFactor"], "0");
        assert!(json.get("walletAddress").is_some());
        assert!(json.get("availableBorrowsBase").is_some());
    }

    #[tokio::test]
    async fn test_balance_failure_fails_snapshot() {
        let pool = Address::repeat_byte(0xaa);
        let usdc = Address::repeat_byte(0xbb);

        let chain = Arc::new(MockChain::default());
        chain.respond(pool, account_data_bytes());
        chain.fail(usdc, "execution reverted");

        let reader = AccountReader::new(chain, pool, usdc);
        let err = reader.snapshot(Address::repeat_byte(0x01)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Read(_)));
        assert!(err.to_string().contains("execution reverted"));
    }

    #[tokio::test]
    async fn test_account_failure_fails_snapshot() {
        let pool = Address::repeat_byte(0xaa);
        let usdc = Address::repeat_byte(0xbb);

        let chain = Arc::new(MockChain::default());
        chain.fail(pool, "timeout");
        chain.respond(usdc, U256::from(1u64).abi_encode());

        let reader = AccountReader::new(chain, pool, usdc);
        assert!(matches!(
            reader.snapshot(Address::ZERO).await,
            Err(ServiceError::Read(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_return_fails_snapshot() {
        let pool = Address::repeat_byte(0xaa);
        let usdc = Address::repeat_byte(0xbb);

        let chain = Arc::new(MockChain::default());
        chain.respond(pool, vec![0u8; 10]);
        chain.respond(usdc, U256::from(1u64).abi_encode());

        let reader = AccountReader::new(chain, pool, usdc);
        assert!(reader.snapshot(Address::ZERO).await.is_err());
    }
}
