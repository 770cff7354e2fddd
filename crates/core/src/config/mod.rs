//! Configuration.
//!
//! - Service configuration from environment variables
//! - Network registry (built-in networks plus an optional TOML override file)

mod network;
mod service;

pub use network::{NetworkConfig, NetworkRegistry, DEFAULT_NETWORK};
pub use service::{
    env, LogFormat, ServiceConfig, DEFAULT_BIND_ADDR, DEFAULT_POOL_ADDRESS, DEFAULT_USDC_ADDRESS,
};
