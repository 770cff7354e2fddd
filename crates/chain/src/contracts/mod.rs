//! Contract bindings.
//!
//! Type definitions and calldata helpers for the contracts the service talks
//! to with a known ABI. Caller-supplied ABIs go through [`crate::abi`] instead.

pub mod aave_v3;
pub mod common;

pub use aave_v3::{
    decode_user_account_data, encode_borrow, encode_get_user_account_data, encode_repay,
    encode_supply, encode_withdraw, UserAccountData, REFERRAL_CODE, VARIABLE_RATE_MODE,
};
pub use common::{
    decode_balance_of, encode_approve, encode_balance_of, encode_mint, encode_safe_transfer_from,
};
