//! cfx-tx-sender - transaction assembly and dispatch for Conflux nodes
//!
//! Takes a partially specified [`TransactionIntent`], fills every absent
//! field from the node (chain id, epoch, nonce, gas price, gas and storage
//! limits), then either signs it with a locally held key and broadcasts the
//! raw bytes, or hands the structured transaction to the node's own wallet.

pub mod config;
pub mod error;
pub mod metrics;
pub mod quantity;
pub mod rpc;
pub mod tx;
pub mod wallet;

pub use config::Settings;
pub use error::{Phase, SendError, SendResult, TransportError};
pub use rpc::{HttpTransport, NodeClient, Transport};
pub use tx::{
    ResolvedTransaction, SenderRef, SignedTransaction, TransactionIntent, TransactionSender,
};
pub use wallet::{Credential, Keyring, LocalAccount, LocalKeyring};
