//! Service configuration loaded from the environment.

use super::network::{NetworkConfig, NetworkRegistry, DEFAULT_NETWORK};
use crate::error::ServiceError;
use crate::nft::NftCatalog;
use alloy::primitives::Address;
use std::net::SocketAddr;

/// Environment variable names.
pub mod env {
    pub const WALLET_PRIVATE_KEY: &str = "WALLET_PRIVATE_KEY";
    pub const NETWORK_ID: &str = "NETWORK_ID";
    pub const RPC_URL: &str = "RPC_URL";
    pub const AAVE_POOL_ADDRESS: &str = "AAVE_POOL_ADDRESS";
    pub const USDC_ADDRESS: &str = "USDC_ADDRESS";
    pub const NFT_CONTRACT_ADDRESS: &str = "NFT_CONTRACT_ADDRESS";
    pub const FAUCET_URL: &str = "FAUCET_URL";
    pub const PUBLIC_BASE_URL: &str = "PUBLIC_BASE_URL";
    pub const BIND_ADDR: &str = "BIND_ADDR";
    pub const NETWORKS_CONFIG: &str = "NETWORKS_CONFIG";
    pub const NFT_CATALOG: &str = "NFT_CATALOG";
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
}

/// Aave V3 pool on Base Sepolia.
pub const DEFAULT_POOL_ADDRESS: &str = "0x07eA79F68B2B3df564D0A34F8e19D9B1e339814b";

/// USDC on Base Sepolia.
pub const DEFAULT_USDC_ADDRESS: &str = "0x036CbD53842c5426634e7929541eC2318f3dCF7e";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// `json` (any case) selects JSON; everything else is pretty.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Everything the service needs, resolved once at startup.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Hex secp256k1 key of the demo wallet
    pub private_key: String,
    /// Network the wallet and lending market live on
    pub network_id: String,
    /// Aave V3 pool
    pub pool_address: Address,
    /// Lending asset
    pub usdc_address: Address,
    /// Multi-token contract for minting
    pub nft_contract: Option<Address>,
    /// Faucet endpoint; `None` disables auto-funding
    pub faucet_url: Option<String>,
    /// Base URL for NFT images
    pub public_base_url: Option<String>,
    /// Listen address
    pub bind_addr: SocketAddr,
    /// Known networks
    pub networks: NetworkRegistry,
    /// NFT metadata catalog
    pub nft_catalog: NftCatalog,
    pub log_format: LogFormat,
}

impl ServiceConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServiceError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let private_key = get(env::WALLET_PRIVATE_KEY).ok_or_else(|| {
            ServiceError::Configuration(format!("{} is required", env::WALLET_PRIVATE_KEY))
        })?;

        let mut networks = NetworkRegistry::builtin();
        if let Some(path) = get(env::NETWORKS_CONFIG) {
            networks
                .merge_file(&path)
                .map_err(|e| ServiceError::Configuration(format!("{e:#}")))?;
        }

        let network_id = get(env::NETWORK_ID).unwrap_or_else(|| DEFAULT_NETWORK.to_string());
        let Some(wallet_network) = networks.get(&network_id).cloned() else {
            return Err(ServiceError::Configuration(format!(
                "unknown {} '{}' (known: {})",
                env::NETWORK_ID,
                network_id,
                networks.ids().collect::<Vec<_>>().join(", ")
            )));
        };
        if let Some(rpc_url) = get(env::RPC_URL) {
            networks.insert(NetworkConfig {
                rpc_url,
                ..wallet_network
            });
        }

        let pool_address = parse_address(
            env::AAVE_POOL_ADDRESS,
            &get(env::AAVE_POOL_ADDRESS).unwrap_or_else(|| DEFAULT_POOL_ADDRESS.to_string()),
        )?;
        let usdc_address = parse_address(
            env::USDC_ADDRESS,
            &get(env::USDC_ADDRESS).unwrap_or_else(|| DEFAULT_USDC_ADDRESS.to_string()),
        )?;
        let nft_contract = get(env::NFT_CONTRACT_ADDRESS)
            .map(|v| parse_address(env::NFT_CONTRACT_ADDRESS, &v))
            .transpose()?;

        let bind_addr_raw = get(env::BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr_raw.parse().map_err(|_| {
            ServiceError::Configuration(format!(
                "invalid {} '{}'",
                env::BIND_ADDR,
                bind_addr_raw
            ))
        })?;

        let nft_catalog = match get(env::NFT_CATALOG) {
            Some(path) => NftCatalog::from_file(&path)
                .map_err(|e| ServiceError::Configuration(format!("{e:#}")))?,
            None => NftCatalog::builtin(),
        };

        Ok(Self {
            private_key,
            network_id,
            pool_address,
            usdc_address,
            nft_contract,
            faucet_url: get(env::FAUCET_URL),
            public_base_url: get(env::PUBLIC_BASE_URL)
                .map(|url| url.trim_end_matches('/').to_string()),
            bind_addr,
            networks,
            nft_catalog,
            log_format: LogFormat::parse(get(env::LOG_FORMAT).as_deref()),
        })
    }

    /// The wallet's network. Presence is checked at load time.
    pub fn wallet_network(&self) -> Result<&NetworkConfig, ServiceError> {
        self.networks.get(&self.network_id).ok_or_else(|| {
            ServiceError::Configuration(format!("unknown network '{}'", self.network_id))
        })
    }

    /// Log the configuration summary (no secrets).
    pub fn log_config(&self) {
        tracing::info!(
            network = %self.network_id,
            pool = %self.pool_address,
            usdc = %self.usdc_address,
            nft_contract = ?self.nft_contract,
            faucet = self.faucet_url.is_some(),
            bind_addr = %self.bind_addr,
            networks = self.networks.len(),
            nft_catalog = self.nft_catalog.len(),
            "Service configuration"
        );
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("private_key", &"<redacted>")
            .field("network_id", &self.network_id)
            .field("pool_address", &self.pool_address)
            .field("usdc_address", &self.usdc_address)
            .field("nft_contract", &self.nft_contract)
            .field("faucet_url", &self.faucet_url)
            .field("public_base_url", &self.public_base_url)
            .field("bind_addr", &self.bind_addr)
            .field("networks", &self.networks.len())
            .field("log_format", &self.log_format)
            .finish()
    }
}

fn parse_address(name: &str, value: &str) -> Result<Address, ServiceError> {
    value
        .parse()
        .map_err(|_| ServiceError::Configuration(format!("invalid {name} '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn load(vars: &[(&str, &str)]) -> Result<ServiceConfig, ServiceError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[(env::WALLET_PRIVATE_KEY, DEV_KEY)]).unwrap();

        assert_eq!(config.network_id, "base-sepolia");
        assert_eq!(config.pool_address, DEFAULT_POOL_ADDRESS.parse::<Address>().unwrap());
        assert_eq!(config.usdc_address, DEFAULT_USDC_ADDRESS.parse::<Address>().unwrap());
        assert_eq!(config.bind_addr.port(), 3000);
        assert!(config.nft_contract.is_none());
        assert!(config.faucet_url.is_none());
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.wallet_network().unwrap().chain_id, 84532);
        assert!(!config.nft_catalog.is_empty());
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ServiceError::Configuration(_)));
        assert!(err.to_string().contains(env::WALLET_PRIVATE_KEY));

        // Blank counts as unset
        assert!(load(&[(env::WALLET_PRIVATE_KEY, "  ")]).is_err());
    }

    #[test]
    fn test_unknown_network_is_fatal() {
        let err = load(&[(env::WALLET_PRIVATE_KEY, DEV_KEY), (env::NETWORK_ID, "moonbase")]).unwrap_err();
        assert!(matches!(err, ServiceError::Configuration(_)));
        assert!(err.to_string().contains("base-sepolia"));
    }

    #[test]
    fn test_invalid_address_is_fatal() {
        let err = load(&[(env::WALLET_PRIVATE_KEY, DEV_KEY), (env::USDC_ADDRESS, "0x1234")]).unwrap_err();
        assert!(err.to_string().contains(env::USDC_ADDRESS));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            (env::WALLET_PRIVATE_KEY, DEV_KEY),
            (env::NETWORK_ID, "base-mainnet"),
            (env::RPC_URL, "http://127.0.0.1:8545"),
            (env::NFT_CONTRACT_ADDRESS, "0x0000000000000000000000000000000000000042"),
            (env::FAUCET_URL, "http://faucet.local/fund"),
            (env::PUBLIC_BASE_URL, "https://demo.example/"),
            (env::BIND_ADDR, "127.0.0.1:8080"),
            (env::LOG_FORMAT, "JSON"),
        ])
        .unwrap();

        let network = config.wallet_network().unwrap();
        assert_eq!(network.chain_id, 8453);
        assert_eq!(network.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(network.explorer_url.as_deref(), Some("https://basescan.org"));
        assert!(config.nft_contract.is_some());
        assert_eq!(config.public_base_url.as_deref(), Some("https://demo.example"));
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.log_format, LogFormat::Json);
        // Other networks keep their public endpoints
        assert_eq!(
            config.networks.get("base-sepolia").unwrap().rpc_url,
            "https://sepolia.base.org"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = load(&[(env::WALLET_PRIVATE_KEY, DEV_KEY)]).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("ac0974bec39a17e3"));
        assert!(rendered.contains("<redacted>"));
    }
}
