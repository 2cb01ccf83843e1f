//! Keyring collaborator: who can sign locally, and the signing itself
//!
//! The sender only ever asks a [`Keyring`] two questions: does it hold a
//! key for this address, and can it sign this resolved transaction.
//! [`LocalKeyring`] is the in-memory implementation.

mod local;

pub use local::LocalKeyring;

use crate::error::KeyringError;
use crate::tx::{ResolvedTransaction, Signature};

use ethers::types::Address;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Local signing capability
pub trait Keyring: Send + Sync {
    /// Whether a private key for `address` is held locally
    fn has_local_key(&self, address: &Address) -> bool;

    /// Sign the canonical hash of `transaction` with the key for `address`
    fn sign(
        &self,
        address: &Address,
        transaction: &ResolvedTransaction,
        credential: Option<&Credential>,
    ) -> Result<Signature, KeyringError>;
}

/// Handle to an account whose key lives in a keyring
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalAccount {
    address: Address,
}

impl LocalAccount {
    pub(crate) fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

/// Unlock password, passed through to whichever side signs.
///
/// Wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential::new("password");
        assert_eq!(format!("{:?}", credential), "Credential(<redacted>)");
        assert_eq!(credential.expose(), "password");
    }

    #[test]
    fn test_credential_debug_does_not_expose_secret() {
        let credential = Credential::new("hunter2");
        let debug_output = format!("{credential:?}");
        assert!(!debug_output.contains("hunter2"));
    }

    #[test]
    fn test_credential_zeroize_clears_secret() {
        let mut credential = Credential::new("password");
        credential.zeroize();
        assert_eq!(credential.expose(), "");
    }
}
