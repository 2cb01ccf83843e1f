//! Transaction intent, resolved and signed transaction types

use crate::error::{SendError, SendResult};
use crate::quantity::{deserialize_opt_u256, deserialize_opt_u64};
use crate::wallet::LocalAccount;

use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Sender of a transaction, routed once at entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderRef {
    /// Plain address; local only if the keyring holds its key
    Address(Address),
    /// Handle returned by the local keyring
    LocalAccount(LocalAccount),
}

impl SenderRef {
    pub fn address(&self) -> Address {
        match self {
            SenderRef::Address(address) => *address,
            SenderRef::LocalAccount(account) => account.address(),
        }
    }
}

impl From<Address> for SenderRef {
    fn from(address: Address) -> Self {
        SenderRef::Address(address)
    }
}

impl From<LocalAccount> for SenderRef {
    fn from(account: LocalAccount) -> Self {
        SenderRef::LocalAccount(account)
    }
}

impl From<&LocalAccount> for SenderRef {
    fn from(account: &LocalAccount) -> Self {
        SenderRef::LocalAccount(account.clone())
    }
}

impl FromStr for SenderRef {
    type Err = SendError;

    fn from_str(s: &str) -> SendResult<Self> {
        parse_address(s).map(SenderRef::Address)
    }
}

impl<'de> Deserialize<'de> for SenderRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a `0x`-prefixed 20-byte hex address
pub fn parse_address(input: &str) -> SendResult<Address> {
    let digits = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .ok_or_else(|| SendError::invalid(format!("address {:?} is not 0x-prefixed", input)))?;

    let bytes = hex::decode(digits)
        .map_err(|e| SendError::invalid(format!("address {:?} is not hex: {}", input, e)))?;

    if bytes.len() != Address::len_bytes() {
        return Err(SendError::invalid(format!(
            "address {:?} must be 20 bytes, got {}",
            input,
            bytes.len()
        )));
    }

    Ok(Address::from_slice(&bytes))
}

/// Deserialize an optional address through [`parse_address`]
fn deserialize_opt_address<'de, D>(deserializer: D) -> Result<Option<Address>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|text| parse_address(&text))
        .transpose()
        .map_err(serde::de::Error::custom)
}

/// Caller-supplied, partially specified transaction.
///
/// `None` means "resolve this for me"; an explicit zero or empty value is
/// used as given.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TransactionIntent {
    #[serde(default)]
    pub from: Option<SenderRef>,
    #[serde(default, deserialize_with = "deserialize_opt_address")]
    pub to: Option<Address>,
    #[serde(default, deserialize_with = "deserialize_opt_u256")]
    pub nonce: Option<U256>,
    #[serde(default, deserialize_with = "deserialize_opt_u256")]
    pub gas_price: Option<U256>,
    #[serde(default, deserialize_with = "deserialize_opt_u256")]
    pub gas: Option<U256>,
    #[serde(default, deserialize_with = "deserialize_opt_u256")]
    pub value: Option<U256>,
    #[serde(default, deserialize_with = "deserialize_opt_u256")]
    pub storage_limit: Option<U256>,
    #[serde(default, deserialize_with = "deserialize_opt_u64")]
    pub epoch_height: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_opt_u64")]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub data: Option<Bytes>,
}

impl TransactionIntent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an intent from JSON, e.g. `{"from": "0x…", "gasPrice": 10}`
    pub fn from_json(input: &str) -> SendResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| SendError::invalid(format!("malformed transaction intent: {}", e)))
    }

    #[must_use]
    pub fn from(mut self, sender: impl Into<SenderRef>) -> Self {
        self.from = Some(sender.into());
        self
    }

    #[must_use]
    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    #[must_use]
    pub fn nonce(mut self, nonce: impl Into<U256>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    #[must_use]
    pub fn gas_price(mut self, gas_price: impl Into<U256>) -> Self {
        self.gas_price = Some(gas_price.into());
        self
    }

    #[must_use]
    pub fn gas(mut self, gas: impl Into<U256>) -> Self {
        self.gas = Some(gas.into());
        self
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<U256>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn storage_limit(mut self, storage_limit: impl Into<U256>) -> Self {
        self.storage_limit = Some(storage_limit.into());
        self
    }

    #[must_use]
    pub fn epoch_height(mut self, epoch_height: u64) -> Self {
        self.epoch_height = Some(epoch_height);
        self
    }

    #[must_use]
    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    #[must_use]
    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }
}

/// Transaction with every field determined
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTransaction {
    pub from: Address,
    /// `None` only for contract creation
    pub to: Option<Address>,
    pub nonce: U256,
    pub gas_price: U256,
    pub gas: U256,
    pub value: U256,
    pub storage_limit: U256,
    pub epoch_height: u64,
    pub chain_id: u64,
    pub data: Bytes,
}

impl ResolvedTransaction {
    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }
}

/// Recoverable secp256k1 signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    /// Recovery id (0 or 1)
    pub v: u8,
    pub r: U256,
    pub s: U256,
}

/// Locally signed transaction, ready for serialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    transaction: ResolvedTransaction,
    signature: Signature,
}

impl SignedTransaction {
    pub(crate) fn new(transaction: ResolvedTransaction, signature: Signature) -> Self {
        Self {
            transaction,
            signature,
        }
    }

    pub fn transaction(&self) -> &ResolvedTransaction {
        &self.transaction
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0x0123456789012345678901234567890123456789";

    #[test]
    fn test_parse_address() {
        let address = parse_address(ADDRESS).unwrap();
        assert_eq!(format!("{:#x}", address), ADDRESS);

        assert!(matches!(parse_address("0123"), Err(SendError::InvalidInput(_))));
        assert!(matches!(parse_address("0x0123"), Err(SendError::InvalidInput(_))));
        assert!(matches!(parse_address("0xzz"), Err(SendError::InvalidInput(_))));
    }

    #[test]
    fn test_intent_from_json_keeps_absent_and_zero_distinct() {
        let intent = TransactionIntent::from_json(&format!(
            r#"{{"from": "{ADDRESS}", "gasPrice": 10, "gas": "0x400", "storageLimit": "2048", "value": 0}}"#
        ))
        .unwrap();

        assert_eq!(intent.from, Some(SenderRef::Address(parse_address(ADDRESS).unwrap())));
        assert_eq!(intent.gas_price, Some(U256::from(10)));
        assert_eq!(intent.gas, Some(U256::from(1024)));
        assert_eq!(intent.storage_limit, Some(U256::from(2048)));
        assert_eq!(intent.value, Some(U256::zero()));
        assert_eq!(intent.nonce, None);
        assert_eq!(intent.to, None);
        assert_eq!(intent.data, None);
    }

    #[test]
    fn test_intent_from_json_rejects_bad_input() {
        assert!(matches!(
            TransactionIntent::from_json(r#"{"from": "not-an-address"}"#),
            Err(SendError::InvalidInput(_))
        ));
        assert!(matches!(
            TransactionIntent::from_json(r#"{"form": "0x0123456789012345678901234567890123456789"}"#),
            Err(SendError::InvalidInput(_))
        ));
        assert!(matches!(
            TransactionIntent::from_json(r#"{"nonce": "0xnope"}"#),
            Err(SendError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_builder_sets_fields() {
        let to = parse_address(ADDRESS).unwrap();
        let intent = TransactionIntent::new()
            .from(to)
            .to(to)
            .nonce(100u64)
            .epoch_height(1000)
            .chain_id(1)
            .data(vec![0xab, 0xcd]);

        assert_eq!(intent.from.as_ref().map(SenderRef::address), Some(to));
        assert_eq!(intent.nonce, Some(U256::from(100)));
        assert_eq!(intent.epoch_height, Some(1000));
        assert_eq!(intent.chain_id, Some(1));
        assert_eq!(intent.data.as_deref(), Some(&[0xab, 0xcd][..]));
        assert_eq!(intent.gas, None);
    }
}
