//! External HTTP service clients.
//!
//! Currently a single client: the testnet faucet used to fund the demo wallet.

mod faucet;

pub use faucet::{Faucet, FaucetClient};
