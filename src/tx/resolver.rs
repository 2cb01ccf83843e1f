//! Field resolution: turn an intent into a fully specified transaction

use super::gas::{GasEstimator, GasPair};
use super::types::{ResolvedTransaction, TransactionIntent};
use crate::error::{Phase, SendError, SendResult};
use crate::rpc::{methods, NodeClient, TransactionPayload};

use ethers::types::{Address, U256};
use tracing::debug;

/// Fills every absent field from the node or a static default
pub struct FieldResolver {
    client: NodeClient,
    gas_estimator: GasEstimator,
}

impl FieldResolver {
    pub fn new(client: NodeClient, gas_estimator: GasEstimator) -> Self {
        Self {
            client,
            gas_estimator,
        }
    }

    /// Resolve `intent` for sender `from`.
    ///
    /// All-or-nothing: the first failed query aborts the whole resolution.
    pub async fn resolve(
        &self,
        intent: &TransactionIntent,
        from: Address,
    ) -> SendResult<ResolvedTransaction> {
        // Validated before any query goes out
        let gas_pair = GasPair::from_parts(intent.gas, intent.storage_limit)?;

        let (chain_id, epoch_height, nonce, gas_price) = futures::try_join!(
            self.chain_id(intent.chain_id),
            self.epoch_height(intent.epoch_height),
            self.nonce(intent.nonce, &from),
            self.gas_price(intent.gas_price),
        )?;

        let to = intent.to;
        let value = intent.value.unwrap_or_default();
        let data = intent.data.clone().unwrap_or_default();

        let limits = match gas_pair {
            GasPair::Given(limits) => limits,
            GasPair::Absent => match self.gas_estimator.transfer_limits(to.as_ref(), &data) {
                Some(limits) => limits,
                None => {
                    let request = TransactionPayload::new(from)
                        .to(to)
                        .value(value)
                        .data(&data)
                        .nonce(nonce)
                        .gas_price(gas_price);
                    self.gas_estimator.estimate(&self.client, &request).await?
                }
            },
        };

        debug!(
            "Resolved tx from {:#x}: nonce={} gas_price={} gas={} storage_limit={} epoch={} chain={}",
            from,
            nonce,
            gas_price,
            limits.gas,
            limits.storage_limit,
            epoch_height,
            chain_id
        );

        Ok(ResolvedTransaction {
            from,
            to,
            nonce,
            gas_price,
            gas: limits.gas,
            value,
            storage_limit: limits.storage_limit,
            epoch_height,
            chain_id,
            data,
        })
    }

    async fn chain_id(&self, given: Option<u64>) -> SendResult<u64> {
        if let Some(chain_id) = given {
            return Ok(chain_id);
        }
        let status = self
            .client
            .get_status()
            .await
            .map_err(|e| SendError::upstream(Phase::Resolution, methods::GET_STATUS, e))?;
        Ok(status.chain_id.as_u64())
    }

    async fn epoch_height(&self, given: Option<u64>) -> SendResult<u64> {
        if let Some(epoch_height) = given {
            return Ok(epoch_height);
        }
        self.client
            .get_epoch_number()
            .await
            .map_err(|e| SendError::upstream(Phase::Resolution, methods::EPOCH_NUMBER, e))
    }

    async fn nonce(&self, given: Option<U256>, from: &Address) -> SendResult<U256> {
        if let Some(nonce) = given {
            return Ok(nonce);
        }
        self.client
            .get_next_nonce(from)
            .await
            .map_err(|e| SendError::upstream(Phase::Resolution, methods::GET_NEXT_NONCE, e))
    }

    async fn gas_price(&self, given: Option<U256>) -> SendResult<U256> {
        if let Some(gas_price) = given {
            return Ok(gas_price);
        }
        self.client
            .get_gas_price()
            .await
            .map_err(|e| SendError::upstream(Phase::Resolution, methods::GAS_PRICE, e))
    }
}
