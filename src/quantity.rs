//! Hex quantity formatting and lenient numeric parsing
//!
//! RPC quantities are `0x`-prefixed minimal big-endian hex (`"0x0"` for
//! zero). Caller-supplied intents may use JSON numbers, hex strings or
//! decimal strings.

use ethers::types::U256;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// Format a quantity as minimal `0x` hex
pub fn to_quantity(value: U256) -> String {
    format!("0x{:x}", value)
}

/// Format a byte string as `0x` hex
pub fn to_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a decimal or `0x` hex string into a `U256`
pub fn parse_u256(input: &str) -> Result<U256, String> {
    let input = input.trim();
    match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some("") => Err(format!("empty hex quantity {:?}", input)),
        Some(digits) => U256::from_str_radix(digits, 16)
            .map_err(|e| format!("invalid hex quantity {:?}: {:?}", input, e)),
        None if input.is_empty() => Err("empty quantity".to_string()),
        None => U256::from_dec_str(input)
            .map_err(|e| format!("invalid decimal quantity {:?}: {:?}", input, e)),
    }
}

/// Parse a decimal or `0x` hex string into a `u64`
pub fn parse_u64(input: &str) -> Result<u64, String> {
    narrow_u64(parse_u256(input)?)
}

fn narrow_u64(value: U256) -> Result<u64, String> {
    if value > U256::from(u64::MAX) {
        return Err(format!("quantity {} does not fit in 64 bits", value));
    }
    Ok(value.as_u64())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumericInput {
    Number(u64),
    Text(String),
}

impl NumericInput {
    fn into_u256(self) -> Result<U256, String> {
        match self {
            NumericInput::Number(n) => Ok(U256::from(n)),
            NumericInput::Text(s) => parse_u256(&s),
        }
    }
}

/// Serde helper for optional quantities given as numbers or strings
pub fn deserialize_opt_u256<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumericInput>::deserialize(deserializer)?
        .map(NumericInput::into_u256)
        .transpose()
        .map_err(D::Error::custom)
}

/// Serde helper for optional `u64` fields given as numbers or strings
pub fn deserialize_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumericInput>::deserialize(deserializer)?
        .map(|input| input.into_u256().and_then(narrow_u64))
        .transpose()
        .map_err(D::Error::custom)
}
