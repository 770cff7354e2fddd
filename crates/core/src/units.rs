//! Fixed-point unit conversion.
//!
//! On-chain amounts are integers scaled by a per-asset decimal count. These
//! helpers convert between that representation and decimal strings without
//! going through floating point.

use alloy::primitives::U256;
use thiserror::Error;

/// Aave base-currency decimals (USD, 8)
pub const BASE_CURRENCY_DECIMALS: u8 = 8;

/// Health factor decimals (WAD, 18)
pub const HEALTH_FACTOR_DECIMALS: u8 = 18;

/// USDC decimals (6)
pub const USDC_DECIMALS: u8 = 6;

/// Native token decimals (18)
pub const NATIVE_DECIMALS: u8 = 18;

/// Largest decimal count representable in a U256 scale factor.
pub const MAX_DECIMALS: u8 = 77;

/// Pre-computed powers of 10 for fast decimal conversion
const POW10: [u128; 39] = [
    1,
    10,
    100,
    1_000,
    10_000,
    100_000,
    1_000_000,
    10_000_000,
    100_000_000,
    1_000_000_000,
    10_000_000_000,
    100_000_000_000,
    1_000_000_000_000,
    10_000_000_000_000,
    100_000_000_000_000,
    1_000_000_000_000_000,
    10_000_000_000_000_000,
    100_000_000_000_000_000,
    1_000_000_000_000_000_000,
    10_000_000_000_000_000_000,
    100_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000_000_000_000_000,
];

/// Amount-string parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("amount is empty")]
    Empty,

    #[error("invalid amount '{0}'")]
    Invalid(String),

    #[error("amount '{value}' has more than {decimals} decimal places")]
    TooPrecise { value: String, decimals: u8 },

    #[error("amount '{0}' overflows uint256")]
    Overflow(String),

    #[error("unsupported decimal count {0}")]
    Decimals(u8),
}

/// Fast power of 10 lookup (up to 10^38)
#[inline(always)]
pub fn pow10(exp: u8) -> U256 {
    if exp < 39 {
        U256::from(POW10[exp as usize])
    } else {
        U256::from(10u64).pow(U256::from(exp))
    }
}

/// Render `value / 10^decimals` as a decimal string.
///
/// Trailing fractional zeros are dropped and an integral value has no
/// decimal point: `format_units(123456789, 8) == "1.23456789"`,
/// `format_units(100000000, 8) == "1"`.
pub fn format_units(value: U256, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }

    let digits = value.to_string();
    let decimals = decimals as usize;
    let (int_part, frac_part) = if digits.len() > decimals {
        let (i, f) = digits.split_at(digits.len() - decimals);
        (i.to_string(), f.to_string())
    } else {
        ("0".to_string(), format!("{digits:0>decimals$}"))
    };

    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.is_empty() {
        int_part
    } else {
        format!("{int_part}.{frac_part}")
    }
}

/// Parse a decimal string into an integer scaled by `10^decimals`.
///
/// Extra fractional digits are accepted only when they are zeros; anything
/// else would silently truncate the amount.
pub fn parse_units(value: &str, decimals: u8) -> Result<U256, UnitsError> {
    if decimals > MAX_DECIMALS {
        return Err(UnitsError::Decimals(decimals));
    }

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (int_part, frac_part) = match trimmed.split_once('.') {
        Some((i, f)) => (i, f),
        None => (trimmed, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(UnitsError::Invalid(value.to_string()));
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return Err(UnitsError::Invalid(value.to_string()));
    }

    let decimals_usize = decimals as usize;
    let frac_part = if frac_part.len() > decimals_usize {
        let (kept, dropped) = frac_part.split_at(decimals_usize);
        if dropped.bytes().any(|b| b != b'0') {
            return Err(UnitsError::TooPrecise {
                value: value.to_string(),
                decimals,
            });
        }
        kept
    } else {
        frac_part
    };

    let overflow = || UnitsError::Overflow(value.to_string());

    let int_value = if int_part.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(int_part, 10).map_err(|_| overflow())?
    };
    let frac_value = if frac_part.is_empty() {
        U256::ZERO
    } else {
        let raw = U256::from_str_radix(frac_part, 10).map_err(|_| overflow())?;
        raw * pow10(decimals - frac_part.len() as u8)
    };

    int_value
        .checked_mul(pow10(decimals))
        .and_then(|scaled| scaled.checked_add(frac_value))
        .ok_or_else(overflow)
}
