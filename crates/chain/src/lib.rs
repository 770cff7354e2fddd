//! Wallet and chain interaction layer.
//!
//! This crate provides:
//! - Read-only chain access ([`ChainReader`], [`RpcReader`])
//! - Transaction signing and submission ([`TransactionSubmitter`], [`LocalWallet`])
//! - Contract bindings for the Aave V3 pool, ERC20 and ERC1155
//! - Runtime ABI coercion and the generic read-only [`ContractInvoker`]

pub mod abi;
pub mod contracts;
mod invoker;
mod provider;
mod signer;

pub use abi::{ArgKind, InvocationError};
pub use invoker::{ContractInvoker, ReadCall};
pub use provider::{ChainReader, RpcReader};
pub use signer::{LocalWallet, NonceManager, TransactionSubmitter, WalletError};
