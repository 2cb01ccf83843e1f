//! Signing path selection

use super::types::SenderRef;
use crate::error::{SendError, SendResult};
use crate::wallet::{Keyring, LocalAccount};

use ethers::types::Address;

/// Who signs: this process, or the node's own wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningPath {
    Local(LocalAccount),
    Remote(Address),
}

impl SigningPath {
    pub fn address(&self) -> Address {
        match self {
            SigningPath::Local(account) => account.address(),
            SigningPath::Remote(address) => *address,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SigningPath::Local(_) => "local",
            SigningPath::Remote(_) => "remote",
        }
    }
}

/// Pick the signing path for `sender`.
///
/// A plain address is local iff the keyring holds its key. A local handle
/// must still be held; a stale handle is rejected rather than sent remote.
pub fn route(sender: &SenderRef, keyring: &dyn Keyring) -> SendResult<SigningPath> {
    match sender {
        SenderRef::LocalAccount(account) => {
            if keyring.has_local_key(&account.address()) {
                Ok(SigningPath::Local(account.clone()))
            } else {
                Err(SendError::invalid(format!(
                    "local account {:#x} is not held by the keyring",
                    account.address()
                )))
            }
        }
        SenderRef::Address(address) => {
            if keyring.has_local_key(address) {
                Ok(SigningPath::Local(LocalAccount::new(*address)))
            } else {
                Ok(SigningPath::Remote(*address))
            }
        }
    }
}
