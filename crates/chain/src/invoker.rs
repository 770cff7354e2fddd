//! ABI-driven read-only contract invocation.

use std::sync::Arc;

use alloy::dyn_abi::{FunctionExt, JsonAbiExt};
use alloy::json_abi::JsonAbi;
use alloy::primitives::Address;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::abi::{self, InvocationError};
use crate::provider::ChainReader;

/// A fully parsed read request.
#[derive(Debug, Clone)]
pub struct ReadCall {
    pub contract: Address,
    pub abi: JsonAbi,
    pub method: String,
    pub args: Map<String, Value>,
}

/// Executes view/pure functions described by a caller-supplied ABI.
#[derive(Clone)]
pub struct ContractInvoker {
    reader: Arc<dyn ChainReader>,
}

impl std::fmt::Debug for ContractInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractInvoker").finish_non_exhaustive()
    }
}

impl ContractInvoker {
    pub fn new(reader: Arc<dyn ChainReader>) -> Self {
        Self { reader }
    }

    /// Resolve, encode, call, decode and render.
    ///
    /// The returned JSON never contains integers as JSON numbers.
    pub async fn read(&self, call: &ReadCall) -> Result<Value, InvocationError> {
        let function = abi::resolve_function(&call.abi, &call.method, &call.args)?;
        abi::ensure_read_only(function)?;

        let values = abi::encode_args(function, &call.args)?;
        let calldata = function
            .abi_encode_input(&values)
            .map_err(|e| InvocationError::ArgumentMismatch {
                name: call.method.clone(),
                ty: function.signature(),
                reason: e.to_string(),
            })?;

        debug!(
            contract = %call.contract,
            method = %function.signature(),
            calldata_len = calldata.len(),
            "Invoking read-only contract method"
        );

        let output = self
            .reader
            .call(call.contract, calldata.into())
            .await
            .map_err(|e| {
                warn!(contract = %call.contract, method = %call.method, error = %e, "Contract read failed");
                InvocationError::Call(format!("{e:#}"))
            })?;

        let decoded = function
            .abi_decode_output(&output, true)
            .map_err(|e| InvocationError::Decode(e.to_string()))?;

        Ok(abi::render_outputs(&decoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::dyn_abi::DynSolValue;
    use alloy::primitives::{Bytes, U256};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Reader that returns canned return data and records calldata.
    struct CannedReader {
        response: anyhow::Result<Vec<u8>>,
        calls: Mutex<Vec<(Address, Bytes)>>,
    }

    impl CannedReader {
        fn ok(data: Vec<u8>) -> Arc<Self> {
            Arc::new(Self { response: Ok(data), calls: Mutex::new(Vec::new()) })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Err(anyhow::anyhow!(message.to_string())),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChainReader for CannedReader {
        async fn call(&self, to: Address, input: Bytes) -> anyhow::Result<Bytes> {
            self.calls.lock().push((to, input));
            match &self.response {
                Ok(data) => Ok(Bytes::from(data.clone())),
                Err(e) => Err(anyhow::anyhow!(e.to_string())),
            }
        }

        async fn native_balance(&self, _account: Address) -> anyhow::Result<U256> {
            Ok(U256::ZERO)
        }

        async fn block_number(&self) -> anyhow::Result<u64> {
            Ok(1)
        }
    }

    fn read_call(abi: Value, method: &str, args: Value) -> ReadCall {
        ReadCall {
            contract: "0x0B54409D1B1dd1438eDF7729CDAea3E331Ae12ED".parse().unwrap(),
            abi: abi::parse_abi(&abi).unwrap(),
            method: method.to_string(),
            args: args.as_object().cloned().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_uint256_max_round_trips_as_string() {
        let encoded = DynSolValue::Tuple(vec![DynSolValue::Uint(U256::MAX, 256)]).abi_encode_params();
        let reader = CannedReader::ok(encoded);
        let invoker = ContractInvoker::new(reader.clone());

        let call = read_call(
            json!(["function totalSupply() view returns (uint256)"]),
            "totalSupply",
            json!({}),
        );
        let result = invoker.read(&call).await.unwrap();

        assert_eq!(
            result,
            json!("115792089237316195423570985008687907853269984665640564039457584007913129639935")
        );

        let calls = reader.calls.lock();
        assert_eq!(calls.len(), 1);
        // totalSupply() selector
        assert_eq!(calls[0].1.as_ref(), &[0x18, 0x16, 0x0d, 0xdd]);
    }

    #[tokio::test]
    async fn test_multiple_outputs_render_as_array() {
        let encoded = DynSolValue::Tuple(vec![
            DynSolValue::Uint(U256::from(1u8), 256),
            DynSolValue::Array(vec![DynSolValue::Uint(U256::MAX, 256)]),
            DynSolValue::Address(Address::ZERO),
        ])
        .abi_encode_params();
        let invoker = ContractInvoker::new(CannedReader::ok(encoded));

        let call = read_call(
            json!([{
                "type": "function",
                "name": "snapshot",
                "stateMutability": "view",
                "inputs": [{ "name": "user", "type": "address" }],
                "outputs": [
                    { "name": "count", "type": "uint256" },
                    { "name": "values", "type": "uint256[]" },
                    { "name": "owner", "type": "address" }
                ]
            }]),
            "snapshot",
            json!({ "user": "0x0000000000000000000000000000000000000001" }),
        );

        let result = invoker.read(&call).await.unwrap();
        assert_eq!(
            result,
            json!([
                "1",
                ["115792089237316195423570985008687907853269984665640564039457584007913129639935"],
                "0x0000000000000000000000000000000000000000"
            ])
        );
    }

    #[tokio::test]
    async fn test_call_failure_is_invocation_error() {
        let reader = CannedReader::failing("execution reverted");
        let invoker = ContractInvoker::new(reader);

        let call = read_call(
            json!(["function pureUint16() pure returns (uint16)"]),
            "pureUint16",
            json!({}),
        );
        let err = invoker.read(&call).await.unwrap_err();
        assert!(matches!(err, InvocationError::Call(ref msg) if msg.contains("execution reverted")));
    }

    #[tokio::test]
    async fn test_mutating_method_never_reaches_the_chain() {
        let reader = CannedReader::ok(Vec::new());
        let invoker = ContractInvoker::new(reader.clone());

        let call = read_call(
            json!(["function approve(address spender, uint256 amount) returns (bool)"]),
            "approve",
            json!({ "spender": "0x0000000000000000000000000000000000000001", "amount": "1" }),
        );
        let err = invoker.read(&call).await.unwrap_err();
        assert!(matches!(err, InvocationError::NotReadOnly { .. }));
        assert!(reader.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_empty_return_data_is_decode_error() {
        let invoker = ContractInvoker::new(CannedReader::ok(Vec::new()));
        let call = read_call(
            json!(["function decimals() view returns (uint8)"]),
            "decimals",
            json!({}),
        );
        let err = invoker.read(&call).await.unwrap_err();
        assert!(matches!(err, InvocationError::Decode(_)));
    }
}
