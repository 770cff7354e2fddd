//! Wallet SDK service logic.
//!
//! This crate provides:
//! - Service configuration and the network registry
//! - Fixed-point unit conversion
//! - Aave account snapshots and the lending action dispatcher
//! - The multi-network contract-read proxy
//! - NFT mint, transfer and metadata

mod account;
pub mod config;
mod contract_reader;
mod error;
mod lending;
mod nft;
pub mod units;

#[cfg(test)]
mod testing;

pub use account::{AccountReader, AccountSnapshot};
pub use config::{LogFormat, NetworkConfig, NetworkRegistry, ServiceConfig};
pub use contract_reader::{ContractReadRequest, ContractReadService};
pub use error::{ActionError, Result, ServiceError};
pub use lending::{ActionDispatcher, LendingAction, LendingMarket, TransactionResult, UnknownAction};
pub use nft::{
    parse_metadata_slug, parse_token_id, MintResult, NftCatalog, NftMetadata, NftService,
    TransferResult, MINT_MIN_BALANCE, TRANSFER_MIN_BALANCE,
};
