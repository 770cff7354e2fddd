//! AAVE V3 contract interfaces.
//!
//! ABI bindings and calldata helpers for the Pool entry points used by the
//! lending flow: account data, supply, borrow, repay and withdraw.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use anyhow::Result;

// AAVE V3 Pool interface
sol! {
    /// Aave V3 Pool interface (subset for the lending desk)
    interface IPool {
        function getUserAccountData(address user) external view returns (
            uint256 totalCollateralBase,
            uint256 totalDebtBase,
            uint256 availableBorrowsBase,
            uint256 currentLiquidationThreshold,
            uint256 ltv,
            uint256 healthFactor
        );

        function supply(address asset, uint256 amount, address onBehalfOf, uint16 referralCode) external;

        function borrow(
            address asset,
            uint256 amount,
            uint256 interestRateMode,
            uint16 referralCode,
            address onBehalfOf
        ) external;

        function repay(
            address asset,
            uint256 amount,
            uint256 interestRateMode,
            address onBehalfOf
        ) external returns (uint256);

        function withdraw(address asset, uint256 amount, address to) external returns (uint256);
    }
}

/// Variable-rate debt. Stable rate is disabled on current V3 markets.
pub const VARIABLE_RATE_MODE: u64 = 2;

/// No referral.
pub const REFERRAL_CODE: u16 = 0;

/// Raw `getUserAccountData` result.
///
/// Base-currency amounts carry 8 decimals, the health factor 18;
/// liquidation threshold and LTV are basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserAccountData {
    pub total_collateral_base: U256,
    pub total_debt_base: U256,
    pub available_borrows_base: U256,
    pub current_liquidation_threshold: U256,
    pub ltv: U256,
    pub health_factor: U256,
}

/// Encode `getUserAccountData(user)`.
pub fn encode_get_user_account_data(user: Address) -> Bytes {
    IPool::getUserAccountDataCall { user }.abi_encode().into()
}

/// Decode the `getUserAccountData` return tuple.
pub fn decode_user_account_data(data: &[u8]) -> Result<UserAccountData> {
    let ret = IPool::getUserAccountDataCall::abi_decode_returns(data, true)?;
    Ok(UserAccountData {
        total_collateral_base: ret.totalCollateralBase,
        total_debt_base: ret.totalDebtBase,
        available_borrows_base: ret.availableBorrowsBase,
        current_liquidation_threshold: ret.currentLiquidationThreshold,
        ltv: ret.ltv,
        health_factor: ret.healthFactor,
    })
}

/// Encode `supply(asset, amount, onBehalfOf, 0)`.
pub fn encode_supply(asset: Address, amount: U256, on_behalf_of: Address) -> Bytes {
    IPool::supplyCall {
        asset,
        amount,
        onBehalfOf: on_behalf_of,
        referralCode: REFERRAL_CODE,
    }
    .abi_encode()
    .into()
}

/// Encode a variable-rate `borrow`.
pub fn encode_borrow(asset: Address, amount: U256, on_behalf_of: Address) -> Bytes {
    IPool::borrowCall {
        asset,
        amount,
        interestRateMode: U256::from(VARIABLE_RATE_MODE),
        referralCode: REFERRAL_CODE,
        onBehalfOf: on_behalf_of,
    }
    .abi_encode()
    .into()
}

/// Encode a variable-rate `repay`.
pub fn encode_repay(asset: Address, amount: U256, on_behalf_of: Address) -> Bytes {
    IPool::repayCall {
        asset,
        amount,
        interestRateMode: U256::from(VARIABLE_RATE_MODE),
        onBehalfOf: on_behalf_of,
    }
    .abi_encode()
    .into()
}

/// Encode `withdraw(asset, amount, to)`.
pub fn encode_withdraw(asset: Address, amount: U256, to: Address) -> Bytes {
    IPool::withdrawCall { asset, amount, to }.abi_encode().into()
}
