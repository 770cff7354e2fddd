pub mod aave;
pub mod contract_reader;
pub mod health;
pub mod nft;
