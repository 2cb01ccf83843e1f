//! RPC module - the transport seam and typed node queries
//!
//! This module provides:
//! - The [`Transport`] trait every node call goes through
//! - [`NodeClient`], typed wrappers for the methods the sender needs
//! - Wire payloads for estimation and structured submission
//! - [`HttpTransport`], a multi-endpoint HTTP implementation

pub mod provider;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use provider::HttpTransport;

use crate::error::TransportError;
use crate::quantity::{to_data, to_quantity};
use crate::wallet::Credential;

use async_trait::async_trait;
use ethers::types::{Address, H256, U256, U64};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// JSON-RPC method names
pub mod methods {
    pub const GET_STATUS: &str = "cfx_getStatus";
    pub const EPOCH_NUMBER: &str = "cfx_epochNumber";
    pub const GET_NEXT_NONCE: &str = "cfx_getNextNonce";
    pub const GAS_PRICE: &str = "cfx_gasPrice";
    pub const ESTIMATE_GAS_AND_COLLATERAL: &str = "cfx_estimateGasAndCollateral";
    pub const SEND_RAW_TRANSACTION: &str = "cfx_sendRawTransaction";
    pub const SEND_TRANSACTION: &str = "cfx_sendTransaction";

    /// Methods that broadcast a transaction and must never be re-sent
    pub fn is_submission(method: &str) -> bool {
        method == SEND_RAW_TRANSACTION || method == SEND_TRANSACTION
    }
}

/// A single JSON-RPC round trip
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError>;
}

/// Subset of `cfx_getStatus` the sender reads
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    pub chain_id: U64,
}

/// Result of `cfx_estimateGasAndCollateral`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasAndCollateral {
    pub gas_used: U256,
    pub storage_collateralized: U256,
}

/// Transaction fields as RPC quantities.
///
/// Used both as the call request for estimation and as the structured
/// payload for `cfx_sendTransaction`. Absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl TransactionPayload {
    pub fn new(from: Address) -> Self {
        Self {
            from: format!("{:#x}", from),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn to(mut self, to: Option<Address>) -> Self {
        self.to = to.map(|to| format!("{:#x}", to));
        self
    }

    #[must_use]
    pub fn gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = Some(to_quantity(gas_price));
        self
    }

    #[must_use]
    pub fn gas(mut self, gas: U256) -> Self {
        self.gas = Some(to_quantity(gas));
        self
    }

    #[must_use]
    pub fn storage_limit(mut self, storage_limit: U256) -> Self {
        self.storage_limit = Some(to_quantity(storage_limit));
        self
    }

    #[must_use]
    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(to_quantity(value));
        self
    }

    #[must_use]
    pub fn nonce(mut self, nonce: U256) -> Self {
        self.nonce = Some(to_quantity(nonce));
        self
    }

    /// Empty data is omitted
    #[must_use]
    pub fn data(mut self, data: &[u8]) -> Self {
        self.data = (!data.is_empty()).then(|| to_data(data));
        self
    }
}

/// Typed access to the node, one method per RPC
#[derive(Clone)]
pub struct NodeClient {
    transport: Arc<dyn Transport>,
    epoch_tag: String,
}

impl NodeClient {
    pub fn new(transport: Arc<dyn Transport>, epoch_tag: impl Into<String>) -> Self {
        Self {
            transport,
            epoch_tag: epoch_tag.into(),
        }
    }

    async fn request<R: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Vec<Value>,
    ) -> Result<R, TransportError> {
        crate::metrics::record_rpc_call(method);

        let result = match self.transport.call(method, params).await {
            Ok(value) => serde_json::from_value(value).map_err(|e| TransportError::Decode {
                method: method.to_string(),
                message: e.to_string(),
            }),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            debug!("{} failed: {}", method, e);
            crate::metrics::record_rpc_error(method);
        }
        result
    }

    pub async fn get_status(&self) -> Result<NodeStatus, TransportError> {
        self.request(methods::GET_STATUS, vec![]).await
    }

    /// Latest epoch at the configured tag
    pub async fn get_epoch_number(&self) -> Result<u64, TransportError> {
        let epoch: U64 = self
            .request(methods::EPOCH_NUMBER, vec![json!(self.epoch_tag)])
            .await?;
        Ok(epoch.as_u64())
    }

    /// Next usable nonce, counting the sender's pending transactions
    pub async fn get_next_nonce(&self, address: &Address) -> Result<U256, TransportError> {
        self.request(methods::GET_NEXT_NONCE, vec![json!(format!("{:#x}", address))])
            .await
    }

    pub async fn get_gas_price(&self) -> Result<U256, TransportError> {
        self.request(methods::GAS_PRICE, vec![]).await
    }

    pub async fn estimate_gas_and_collateral(
        &self,
        request: &TransactionPayload,
    ) -> Result<GasAndCollateral, TransportError> {
        let request = serde_json::to_value(request).map_err(|e| TransportError::Decode {
            method: methods::ESTIMATE_GAS_AND_COLLATERAL.to_string(),
            message: e.to_string(),
        })?;
        self.request(
            methods::ESTIMATE_GAS_AND_COLLATERAL,
            vec![request, json!(self.epoch_tag)],
        )
        .await
    }

    /// Broadcast a signed transaction
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<H256, TransportError> {
        self.request(methods::SEND_RAW_TRANSACTION, vec![json!(to_data(raw))])
            .await
    }

    /// Ask the node's wallet to sign and broadcast
    pub async fn send_transaction(
        &self,
        payload: &TransactionPayload,
        password: Option<&Credential>,
    ) -> Result<H256, TransportError> {
        let payload = serde_json::to_value(payload).map_err(|e| TransportError::Decode {
            method: methods::SEND_TRANSACTION.to_string(),
            message: e.to_string(),
        })?;

        let mut params = vec![payload];
        if let Some(password) = password {
            params.push(json!(password.expose()));
        }
        self.request(methods::SEND_TRANSACTION, params).await
    }
}
