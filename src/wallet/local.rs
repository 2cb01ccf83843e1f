//! In-memory keyring of secp256k1 private keys

use super::{Credential, Keyring, LocalAccount};
use crate::error::KeyringError;
use crate::tx::{public_key_to_address, ResolvedTransaction, Signature};

use dashmap::DashMap;
use ethers::core::k256::ecdsa::SigningKey;
use ethers::types::{Address, U256};
use tracing::debug;

/// Keys held in process memory.
///
/// Keys are not encrypted at rest, so the unlock credential is accepted and
/// ignored.
#[derive(Default)]
pub struct LocalKeyring {
    keys: DashMap<Address, SigningKey>,
}

impl LocalKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import a hex private key (with or without `0x`)
    pub fn add_private_key(&self, private_key: &str) -> Result<LocalAccount, KeyringError> {
        let digits = private_key
            .trim()
            .strip_prefix("0x")
            .unwrap_or_else(|| private_key.trim());

        let bytes = hex::decode(digits)
            .map_err(|_| KeyringError::InvalidKey("private key is not hex".to_string()))?;
        if bytes.len() != 32 {
            return Err(KeyringError::InvalidKey(format!(
                "private key must be 32 bytes, got {}",
                bytes.len()
            )));
        }

        let key = SigningKey::from_slice(&bytes)
            .map_err(|_| KeyringError::InvalidKey("private key out of range".to_string()))?;

        Ok(self.add_signing_key(key))
    }

    /// Import an already parsed signing key
    pub fn add_signing_key(&self, key: SigningKey) -> LocalAccount {
        let address = public_key_to_address(key.verifying_key());
        self.keys.insert(address, key);
        debug!("Added local account {:#x}", address);
        LocalAccount::new(address)
    }

    /// Look up the handle for an address held here
    pub fn account(&self, address: &Address) -> Option<LocalAccount> {
        self.keys
            .contains_key(address)
            .then(|| LocalAccount::new(*address))
    }

    /// Forget a key; returns whether it was held
    pub fn remove(&self, address: &Address) -> bool {
        self.keys.remove(address).is_some()
    }

    /// All held accounts, in no particular order
    pub fn accounts(&self) -> Vec<LocalAccount> {
        self.keys
            .iter()
            .map(|entry| LocalAccount::new(*entry.key()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Keyring for LocalKeyring {
    fn has_local_key(&self, address: &Address) -> bool {
        self.keys.contains_key(address)
    }

    fn sign(
        &self,
        address: &Address,
        transaction: &ResolvedTransaction,
        _credential: Option<&Credential>,
    ) -> Result<Signature, KeyringError> {
        let key = self
            .keys
            .get(address)
            .ok_or_else(|| KeyringError::UnknownAccount(format!("{:#x}", address)))?;

        let hash = transaction.signing_hash();
        let (signature, recovery_id) = key
            .sign_prehash_recoverable(hash.as_bytes())
            .map_err(|e| KeyringError::Signing(e.to_string()))?;

        let bytes = signature.to_bytes();
        Ok(Signature {
            v: recovery_id.to_byte(),
            r: U256::from_big_endian(&bytes[..32]),
            s: U256::from_big_endian(&bytes[32..]),
        })
    }
}
