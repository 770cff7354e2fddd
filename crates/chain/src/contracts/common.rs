//! Common token interfaces.
//!
//! ERC20 for the lending asset and ERC1155 for the demo multi-token.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use anyhow::Result;

// ERC20 interface for token interactions
sol! {
    /// Standard ERC20 interface (subset)
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

// ERC1155 multi-token with an owner-gated mint
sol! {
    /// Multi-token interface (subset used by mint/transfer)
    interface IMultiToken {
        function mint(address to, uint256 id, uint256 value) external;
        function safeTransferFrom(address from, address to, uint256 id, uint256 value, bytes data) external;
    }
}

/// Encode `balanceOf(account)`.
pub fn encode_balance_of(account: Address) -> Bytes {
    IERC20::balanceOfCall { account }.abi_encode().into()
}

/// Decode a `balanceOf` result.
pub fn decode_balance_of(data: &[u8]) -> Result<U256> {
    Ok(IERC20::balanceOfCall::abi_decode_returns(data, true)?._0)
}

/// Encode `approve(spender, amount)`.
pub fn encode_approve(spender: Address, amount: U256) -> Bytes {
    IERC20::approveCall { spender, amount }.abi_encode().into()
}

/// Encode `mint(to, id, value)`.
pub fn encode_mint(to: Address, id: U256, value: U256) -> Bytes {
    IMultiToken::mintCall { to, id, value }.abi_encode().into()
}

/// Encode `safeTransferFrom(from, to, id, value, "")`.
pub fn encode_safe_transfer_from(from: Address, to: Address, id: U256, value: U256) -> Bytes {
    IMultiToken::safeTransferFromCall {
        from,
        to,
        id,
        value,
        data: Bytes::new(),
    }
    .abi_encode()
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolValue;

    #[test]
    fn test_approve_encoding() {
        let spender = Address::repeat_byte(0x07);
        let calldata = encode_approve(spender, U256::from(100_000_000u64));

        // approve(address,uint256)
        assert_eq!(&calldata[..4], &[0x09, 0x5e, 0xa7, 0xb3]);

        let decoded = IERC20::approveCall::abi_decode(&calldata, true).unwrap();
        assert_eq!(decoded.spender, spender);
        assert_eq!(decoded.amount, U256::from(100_000_000u64));
    }

    #[test]
    fn test_balance_of_round_trip() {
        let calldata = encode_balance_of(Address::repeat_byte(0x01));
        // balanceOf(address)
        assert_eq!(&calldata[..4], &[0x70, 0xa0, 0x82, 0x31]);

        let raw = U256::from(42_000_000u64).abi_encode();
        assert_eq!(decode_balance_of(&raw).unwrap(), U256::from(42_000_000u64));
    }

    #[test]
    fn test_transfer_encoding_has_empty_data() {
        let calldata = encode_safe_transfer_from(
            Address::repeat_byte(0x01),
            Address::repeat_byte(0x02),
            U256::from(3u64),
            U256::from(1u64),
        );
        let decoded = IMultiToken::safeTransferFromCall::abi_decode(&calldata, true).unwrap();
        assert_eq!(decoded.id, U256::from(3u64));
        assert_eq!(decoded.value, U256::from(1u64));
        assert!(decoded.data.is_empty());
    }
}
