//! Shared helpers for integration tests
//!
//! [`scripted_node`] stands in for a Conflux node, answering from a script
//! pre-filled with the defaults below.

#![allow(dead_code)]

use cfx_tx_sender::config::SenderConfig;
use cfx_tx_sender::rpc::methods;
use cfx_tx_sender::rpc::testing::ScriptedTransport;
use cfx_tx_sender::{LocalKeyring, TransactionSender};
use serde_json::{json, Value};
use std::sync::Arc;

/// Key whose user address is [`LOCAL_ADDRESS`]
pub const PRIVATE_KEY: &str = "0x0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
pub const LOCAL_ADDRESS: &str = "0x1cad0b19bb29d4674531d6f115237e16afce377c";
/// Account held only by the node's wallet
pub const REMOTE_ADDRESS: &str = "0x1b6e0ba6b0d0f3c5a2f1e2c4a58b8e8f1b2c3d4e";
pub const TX_HASH: &str = "0x973540de0cf6826cd9290844d477dab73a72eba514f05446b29e4200e9849401";

pub const CHAIN_ID: u64 = 1;
pub const EPOCH: u64 = 1000;
pub const NONCE: u64 = 100;
pub const GAS_PRICE: u64 = 10;
pub const ESTIMATED_GAS: u64 = 1024;
pub const ESTIMATED_STORAGE: u64 = 2048;

/// Node answering every method with a plausible value
pub fn scripted_node() -> Arc<ScriptedTransport> {
    let node = ScriptedTransport::new();
    node.respond(methods::GET_STATUS, Ok(json!({"chainId": "0x1", "networkId": "0x1"})));
    node.respond(methods::EPOCH_NUMBER, Ok(json!("0x3e8")));
    node.respond(methods::GET_NEXT_NONCE, Ok(json!("0x64")));
    node.respond(methods::GAS_PRICE, Ok(json!("0xa")));
    node.respond(
        methods::ESTIMATE_GAS_AND_COLLATERAL,
        Ok(json!({"gasUsed": "0x400", "gasLimit": "0x500", "storageCollateralized": "0x800"})),
    );
    node.respond(methods::SEND_RAW_TRANSACTION, Ok(json!(TX_HASH)));
    node.respond(methods::SEND_TRANSACTION, Ok(json!(TX_HASH)));
    Arc::new(node)
}

/// Params of the last call to `method`, which must have been made
pub fn params(node: &ScriptedTransport, method: &str) -> Vec<Value> {
    node.last_params(method)
        .unwrap_or_else(|| panic!("{} was never called", method))
}

/// Keyring holding [`PRIVATE_KEY`]
pub fn keyring() -> Arc<LocalKeyring> {
    let keyring = LocalKeyring::new();
    keyring.add_private_key(PRIVATE_KEY).unwrap();
    Arc::new(keyring)
}

pub fn sender(node: &Arc<ScriptedTransport>, keyring: &Arc<LocalKeyring>) -> TransactionSender {
    TransactionSender::new(node.clone(), keyring.clone(), &SenderConfig::default())
}
