//! Runtime ABI handling for the generic contract reader.
//!
//! Callers hand us a JSON ABI, a method name and a loosely-typed mapping of
//! argument names to JSON values. This module:
//! - parses the ABI (JSON descriptors or human-readable signatures)
//! - resolves the function, including overloads
//! - coerces every argument through [`ArgKind`], one conversion per Solidity
//!   type category
//! - renders decoded return values as JSON with integers as decimal strings,
//!   so nothing wider than 53 bits ever becomes a JSON number

use alloy::dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy::json_abi::{Function, JsonAbi, Param, StateMutability};
use alloy::primitives::{Address, B256, I256, U256};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while resolving, encoding or executing a dynamic read.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("invalid ABI: {0}")]
    InvalidAbi(String),

    #[error("method `{0}` not found in ABI")]
    MethodNotFound(String),

    #[error("method `{method}` is {mutability}; only view and pure functions can be read")]
    NotReadOnly { method: String, mutability: String },

    #[error("missing argument `{0}`")]
    MissingArgument(String),

    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),

    #[error("argument `{name}` does not match type {ty}: {reason}")]
    ArgumentMismatch {
        name: String,
        ty: String,
        reason: String,
    },

    #[error("unsupported ABI type `{0}`")]
    UnsupportedType(String),

    #[error("contract call failed: {0}")]
    Call(String),

    #[error("failed to decode return data: {0}")]
    Decode(String),
}

/// Solidity type categories accepted as call arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgKind {
    Uint(usize),
    Int(usize),
    Address,
    Bool,
    Bytes,
    FixedBytes(usize),
    String,
    Array(Box<ArgKind>),
    FixedArray(Box<ArgKind>, usize),
    Tuple(Vec<ArgKind>),
}

impl TryFrom<&DynSolType> for ArgKind {
    type Error = InvocationError;

    fn try_from(ty: &DynSolType) -> Result<Self, Self::Error> {
        Ok(match ty {
            DynSolType::Uint(bits) => Self::Uint(*bits),
            DynSolType::Int(bits) => Self::Int(*bits),
            DynSolType::Address => Self::Address,
            DynSolType::Bool => Self::Bool,
            DynSolType::Bytes => Self::Bytes,
            DynSolType::FixedBytes(size) => Self::FixedBytes(*size),
            DynSolType::String => Self::String,
            DynSolType::Array(inner) => Self::Array(Box::new(Self::try_from(inner.as_ref())?)),
            DynSolType::FixedArray(inner, len) => {
                Self::FixedArray(Box::new(Self::try_from(inner.as_ref())?), *len)
            }
            DynSolType::Tuple(members) => Self::Tuple(
                members
                    .iter()
                    .map(Self::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            // Function pointers (and anything newer) have no sensible string form.
            #[allow(unreachable_patterns)]
            other => return Err(InvocationError::UnsupportedType(other.sol_type_name().into_owned())),
        })
    }
}

impl ArgKind {
    /// Resolve a JSON ABI parameter into an argument kind.
    pub fn from_param(param: &Param) -> Result<Self, InvocationError> {
        let ty: DynSolType = param
            .resolve()
            .map_err(|_| InvocationError::UnsupportedType(param.ty.clone()))?;
        Self::try_from(&ty)
    }

    /// Canonical Solidity spelling, used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            Self::Uint(bits) => format!("uint{bits}"),
            Self::Int(bits) => format!("int{bits}"),
            Self::Address => "address".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Bytes => "bytes".to_string(),
            Self::FixedBytes(size) => format!("bytes{size}"),
            Self::String => "string".to_string(),
            Self::Array(inner) => format!("{}[]", inner.type_name()),
            Self::FixedArray(inner, len) => format!("{}[{len}]", inner.type_name()),
            Self::Tuple(members) => {
                let inner: Vec<String> = members.iter().map(Self::type_name).collect();
                format!("({})", inner.join(","))
            }
        }
    }

    /// Convert a loosely-typed JSON value into an ABI value of this kind.
    ///
    /// Strings are the canonical input form. Numbers and booleans are accepted
    /// where they are unambiguous; arrays and tuples take either a JSON array
    /// or a string containing JSON array text.
    pub fn coerce(&self, raw: &Value) -> Result<DynSolValue, String> {
        match self {
            Self::Uint(bits) => coerce_uint(raw, *bits),
            Self::Int(bits) => coerce_int(raw, *bits),
            Self::Address => {
                let text = expect_text(raw)?;
                text.trim()
                    .parse::<Address>()
                    .map(DynSolValue::Address)
                    .map_err(|e| format!("invalid address: {e}"))
            }
            Self::Bool => match raw {
                Value::Bool(b) => Ok(DynSolValue::Bool(*b)),
                Value::String(s) => match s.trim() {
                    "true" => Ok(DynSolValue::Bool(true)),
                    "false" => Ok(DynSolValue::Bool(false)),
                    other => Err(format!("expected `true` or `false`, got `{other}`")),
                },
                other => Err(format!("expected boolean, got {other}")),
            },
            Self::Bytes => decode_hex(&expect_text(raw)?).map(DynSolValue::Bytes),
            Self::FixedBytes(size) => {
                let bytes = decode_hex(&expect_text(raw)?)?;
                if bytes.len() != *size {
                    return Err(format!("expected {size} bytes, got {}", bytes.len()));
                }
                Ok(DynSolValue::FixedBytes(B256::right_padding_from(&bytes), *size))
            }
            Self::String => match raw {
                Value::String(s) => Ok(DynSolValue::String(s.clone())),
                Value::Number(n) => Ok(DynSolValue::String(n.to_string())),
                Value::Bool(b) => Ok(DynSolValue::String(b.to_string())),
                other => Err(format!("expected string, got {other}")),
            },
            Self::Array(inner) => {
                let items = expect_sequence(raw)?;
                items
                    .iter()
                    .map(|item| inner.coerce(item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(DynSolValue::Array)
            }
            Self::FixedArray(inner, len) => {
                let items = expect_sequence(raw)?;
                if items.len() != *len {
                    return Err(format!("expected {len} elements, got {}", items.len()));
                }
                items
                    .iter()
                    .map(|item| inner.coerce(item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(DynSolValue::FixedArray)
            }
            Self::Tuple(members) => {
                let items = expect_sequence(raw)?;
                if items.len() != members.len() {
                    return Err(format!(
                        "expected {} tuple members, got {}",
                        members.len(),
                        items.len()
                    ));
                }
                members
                    .iter()
                    .zip(items.iter())
                    .map(|(kind, item)| kind.coerce(item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(DynSolValue::Tuple)
            }
        }
    }
}

fn expect_text(raw: &Value) -> Result<String, String> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        other => Err(format!("expected string, got {other}")),
    }
}

/// Numbers arrive either as JSON strings (decimal or 0x-hex) or as JSON
/// integers. Floats are never accepted.
fn integer_text(raw: &Value) -> Result<String, String> {
    match raw {
        Value::String(s) => {
            let text = s.trim();
            if !is_integer_literal(text) {
                return Err(format!("invalid integer `{s}`"));
            }
            Ok(text.to_string())
        }
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        other => Err(format!("expected integer, got {other}")),
    }
}

/// Optional `-`, then decimal digits or `0x` followed by hex digits.
/// U256/I256 parsing alone lets through `""`, `"0x"` and `_` separators.
fn is_integer_literal(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    match unsigned.strip_prefix("0x") {
        Some(hex) => !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()),
        None => !unsigned.is_empty() && unsigned.bytes().all(|b| b.is_ascii_digit()),
    }
}

fn coerce_uint(raw: &Value, bits: usize) -> Result<DynSolValue, String> {
    let text = integer_text(raw)?;
    if text.starts_with('-') {
        return Err("unsigned integer cannot be negative".to_string());
    }
    let value: U256 = text
        .parse()
        .map_err(|e| format!("invalid unsigned integer `{text}`: {e}"))?;
    if value.bit_len() > bits {
        return Err(format!("value does not fit in uint{bits}"));
    }
    Ok(DynSolValue::Uint(value, bits))
}

fn coerce_int(raw: &Value, bits: usize) -> Result<DynSolValue, String> {
    let text = integer_text(raw)?;
    let value: I256 = text
        .parse()
        .map_err(|e| format!("invalid signed integer `{text}`: {e}"))?;
    if bits < 256 {
        let limit = U256::from(1u8) << (bits - 1);
        let magnitude = value.unsigned_abs();
        let fits = if value.is_negative() {
            magnitude <= limit
        } else {
            magnitude < limit
        };
        if !fits {
            return Err(format!("value does not fit in int{bits}"));
        }
    }
    Ok(DynSolValue::Int(value, bits))
}

fn decode_hex(text: &str) -> Result<Vec<u8>, String> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(digits).map_err(|e| format!("invalid hex: {e}"))
}

fn expect_sequence(raw: &Value) -> Result<Vec<Value>, String> {
    match raw {
        Value::Array(items) => Ok(items.clone()),
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => Ok(items),
            _ => Err(format!("expected JSON array, got `{s}`")),
        },
        other => Err(format!("expected array, got {other}")),
    }
}

/// Parse a caller-supplied ABI.
///
/// Accepts the standard JSON descriptor list, or a list of human-readable
/// signatures such as `"function balanceOf(address) view returns (uint256)"`.
pub fn parse_abi(raw: &Value) -> Result<JsonAbi, InvocationError> {
    if let Value::Array(items) = raw {
        if !items.is_empty() && items.iter().all(Value::is_string) {
            let signatures: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            return JsonAbi::parse(signatures)
                .map_err(|e| InvocationError::InvalidAbi(e.to_string()));
        }
    }
    serde_json::from_value(raw.clone()).map_err(|e| InvocationError::InvalidAbi(e.to_string()))
}

/// Key under which an input is expected in the argument map.
/// Unnamed inputs are addressed by position.
fn arg_key(index: usize, param: &Param) -> String {
    if param.name.is_empty() {
        index.to_string()
    } else {
        param.name.clone()
    }
}

fn keys_match(function: &Function, args: &Map<String, Value>) -> bool {
    function.inputs.len() == args.len()
        && function
            .inputs
            .iter()
            .enumerate()
            .all(|(i, p)| args.contains_key(&arg_key(i, p)))
}

/// Find the function named `method`.
///
/// With overloads, the one whose input keys exactly match `args` wins; a
/// single candidate is returned as-is so argument errors point at it.
pub fn resolve_function<'a>(
    abi: &'a JsonAbi,
    method: &str,
    args: &Map<String, Value>,
) -> Result<&'a Function, InvocationError> {
    let candidates = abi
        .function(method)
        .filter(|overloads| !overloads.is_empty())
        .ok_or_else(|| InvocationError::MethodNotFound(method.to_string()))?;

    if let [only] = candidates.as_slice() {
        return Ok(only);
    }

    candidates
        .iter()
        .find(|f| keys_match(f, args))
        .ok_or_else(|| {
            InvocationError::MethodNotFound(format!(
                "{method} (no overload takes arguments [{}])",
                args.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })
}

/// Reject anything that could change state.
pub fn ensure_read_only(function: &Function) -> Result<(), InvocationError> {
    match function.state_mutability {
        StateMutability::View | StateMutability::Pure => Ok(()),
        StateMutability::NonPayable => Err(InvocationError::NotReadOnly {
            method: function.name.clone(),
            mutability: "nonpayable".to_string(),
        }),
        StateMutability::Payable => Err(InvocationError::NotReadOnly {
            method: function.name.clone(),
            mutability: "payable".to_string(),
        }),
    }
}

/// Coerce `args` into ABI values in the function's input order.
pub fn encode_args(
    function: &Function,
    args: &Map<String, Value>,
) -> Result<Vec<DynSolValue>, InvocationError> {
    let keys: Vec<String> = function
        .inputs
        .iter()
        .enumerate()
        .map(|(i, p)| arg_key(i, p))
        .collect();

    if let Some(extra) = args.keys().find(|k| !keys.contains(k)) {
        return Err(InvocationError::UnexpectedArgument(extra.clone()));
    }

    function
        .inputs
        .iter()
        .zip(keys)
        .map(|(param, key)| {
            let raw = args
                .get(&key)
                .ok_or_else(|| InvocationError::MissingArgument(key.clone()))?;
            let kind = ArgKind::from_param(param)?;
            kind.coerce(raw)
                .map_err(|reason| InvocationError::ArgumentMismatch {
                    name: key,
                    ty: kind.type_name(),
                    reason,
                })
        })
        .collect()
}

/// Render a decoded value as JSON. Integers of every width become decimal
/// strings, recursively.
pub fn render_value(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Uint(v, _) => Value::String(v.to_string()),
        DynSolValue::Int(v, _) => Value::String(v.to_string()),
        DynSolValue::Address(a) => Value::String(a.to_checksum(None)),
        DynSolValue::FixedBytes(word, size) => {
            Value::String(format!("0x{}", hex::encode(&word[..*size])))
        }
        DynSolValue::Bytes(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Function(f) => Value::String(f.to_string()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(render_value).collect())
        }
        #[allow(unreachable_patterns)]
        _ => Value::Null,
    }
}

/// A single output is returned bare; several outputs become an array.
pub fn render_outputs(values: &[DynSolValue]) -> Value {
    match values {
        [] => Value::Null,
        [single] => render_value(single),
        many => Value::Array(many.iter().map(render_value).collect()),
    }
}
