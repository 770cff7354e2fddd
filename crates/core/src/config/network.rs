//! Network registry.
//!
//! Built-in public endpoints for the Base and Ethereum networks, optionally
//! extended or overridden by a TOML file:
//!
//! ```toml
//! [networks.base-sepolia]
//! chain_id = 84532
//! rpc_url = "https://base-sepolia.g.alchemy.com/v2/${ALCHEMY_KEY}"
//! explorer_url = "https://sepolia.basescan.org"
//! ```

use anyhow::{Context, Result};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

/// Default network for the wallet, the lending market and contract reads.
pub const DEFAULT_NETWORK: &str = "base-sepolia";

static ENV_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("static pattern"));

/// One EVM network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network identifier, e.g. `base-sepolia`
    #[serde(skip)]
    pub id: String,
    /// Chain ID
    pub chain_id: u64,
    /// HTTP RPC endpoint
    pub rpc_url: String,
    /// Block explorer base URL for transaction links
    #[serde(default)]
    pub explorer_url: Option<String>,
}

impl NetworkConfig {
    fn builtin(id: &str, chain_id: u64, rpc_url: &str, explorer_url: &str) -> Self {
        Self {
            id: id.to_string(),
            chain_id,
            rpc_url: rpc_url.to_string(),
            explorer_url: Some(explorer_url.to_string()),
        }
    }

    /// Explorer link for a transaction, when an explorer is configured.
    pub fn tx_url(&self, tx_hash: impl std::fmt::Display) -> Option<String> {
        self.explorer_url
            .as_ref()
            .map(|base| format!("{}/tx/{}", base.trim_end_matches('/'), tx_hash))
    }
}

#[derive(Debug, Deserialize)]
struct NetworksFile {
    #[serde(default)]
    networks: BTreeMap<String, NetworkConfig>,
}

/// Known networks, keyed by identifier.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: BTreeMap<String, NetworkConfig>,
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NetworkRegistry {
    /// Registry with the built-in public networks.
    pub fn builtin() -> Self {
        let networks = [
            NetworkConfig::builtin(
                "base-sepolia",
                84532,
                "https://sepolia.base.org",
                "https://sepolia.basescan.org",
            ),
            NetworkConfig::builtin(
                "base-mainnet",
                8453,
                "https://mainnet.base.org",
                "https://basescan.org",
            ),
            NetworkConfig::builtin(
                "ethereum-sepolia",
                11155111,
                "https://ethereum-sepolia-rpc.publicnode.com",
                "https://sepolia.etherscan.io",
            ),
            NetworkConfig::builtin(
                "ethereum-mainnet",
                1,
                "https://ethereum-rpc.publicnode.com",
                "https://etherscan.io",
            ),
        ];

        Self {
            networks: networks.into_iter().map(|n| (n.id.clone(), n)).collect(),
        }
    }

    /// Look up a network by identifier.
    pub fn get(&self, id: &str) -> Option<&NetworkConfig> {
        self.networks.get(id)
    }

    /// Insert or replace a network.
    pub fn insert(&mut self, network: NetworkConfig) {
        self.networks.insert(network.id.clone(), network);
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkConfig> {
        self.networks.values()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Merge a networks TOML file, expanding `${VAR}` from the environment.
    pub fn merge_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read networks config {}", path.display()))?;
        let merged = self
            .merge_toml(&content, |name| std::env::var(name).ok())
            .with_context(|| format!("Invalid networks config {}", path.display()))?;
        info!(file = %path.display(), networks = merged, "Loaded networks config");
        Ok(())
    }

    /// Merge networks from TOML text. Returns how many entries were merged.
    pub fn merge_toml(
        &mut self,
        content: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<usize> {
        let file: NetworksFile = toml::from_str(content)?;
        let count = file.networks.len();

        for (id, mut network) in file.networks {
            network.id = id;
            network.rpc_url = expand_env(&network.rpc_url, &lookup);
            network.explorer_url = network
                .explorer_url
                .map(|url| expand_env(&url, &lookup))
                .filter(|url| !url.is_empty());
            debug!(
                network = %network.id,
                chain_id = network.chain_id,
                "Registered network"
            );
            self.insert(network);
        }

        Ok(count)
    }
}

/// Expand ${VAR_NAME} patterns. Unknown variables are left as-is.
fn expand_env(s: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = s.to_string();

    for cap in ENV_PATTERN.captures_iter(s) {
        if let (Some(full_match), Some(var_match)) = (cap.get(0), cap.get(1)) {
            if let Some(value) = lookup(var_match.as_str()) {
                result = result.replace(full_match.as_str(), &value);
            }
        }
    }

    result
}
