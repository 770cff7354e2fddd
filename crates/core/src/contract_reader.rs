//! Generic contract-read proxy.

use crate::error::{Result, ServiceError};
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use walletkit_chain::abi::parse_abi;
use walletkit_chain::{ChainReader, ContractInvoker, ReadCall};

/// Body of a contract-read request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractReadRequest {
    pub contract_address: String,
    /// JSON ABI array (or human-readable signatures)
    pub abi: Value,
    pub method: String,
    #[serde(default)]
    pub args: Option<Map<String, Value>>,
    /// Network identifier; defaults to the service network
    #[serde(default)]
    pub network: Option<String>,
}

/// Routes contract reads to the invoker of the requested network.
pub struct ContractReadService {
    invokers: HashMap<String, ContractInvoker>,
    default_network: String,
}

impl ContractReadService {
    pub fn new(default_network: impl Into<String>) -> Self {
        Self {
            invokers: HashMap::new(),
            default_network: default_network.into(),
        }
    }

    /// Register the reader for a network.
    pub fn with_network(mut self, network: impl Into<String>, reader: Arc<dyn ChainReader>) -> Self {
        self.invokers.insert(network.into(), ContractInvoker::new(reader));
        self
    }

    /// Execute a read-only call and return the rendered result.
    pub async fn read(&self, request: ContractReadRequest) -> Result<Value> {
        let network = request
            .network
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(self.default_network.as_str());

        let invoker = self
            .invokers
            .get(network)
            .ok_or_else(|| ServiceError::validation(format!("Unknown network '{network}'")))?;

        let contract: Address = request.contract_address.trim().parse().map_err(|_| {
            ServiceError::validation(format!(
                "Invalid contract address '{}'",
                request.contract_address
            ))
        })?;

        let call = ReadCall {
            contract,
            abi: parse_abi(&request.abi)?,
            method: request.method,
            args: request.args.unwrap_or_default(),
        };

        debug!(network = network, contract = %contract, method = %call.method, "Contract read");

        invoker.read(&call).await.map_err(|e| {
            warn!(network = network, contract = %contract, method = %call.method, error = %e, "Contract read failed");
            ServiceError::from(e)
        })
    }
}
