//! Gas and storage-limit determination

use crate::error::{Phase, SendError, SendResult};
use crate::rpc::{methods, NodeClient, TransactionPayload};

use ethers::types::{Address, U256};
use tracing::debug;

/// `gas` and `storageLimit`, always decided together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasLimits {
    pub gas: U256,
    pub storage_limit: U256,
}

/// What the caller supplied for the gas pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GasPair {
    Given(GasLimits),
    Absent,
}

impl GasPair {
    /// Both or neither; a half-specified pair is rejected.
    pub(crate) fn from_parts(gas: Option<U256>, storage_limit: Option<U256>) -> SendResult<Self> {
        match (gas, storage_limit) {
            (Some(gas), Some(storage_limit)) => Ok(GasPair::Given(GasLimits { gas, storage_limit })),
            (None, None) => Ok(GasPair::Absent),
            (Some(_), None) => Err(SendError::invalid(
                "gas is set but storageLimit is not; supply both or neither",
            )),
            (None, Some(_)) => Err(SendError::invalid(
                "storageLimit is set but gas is not; supply both or neither",
            )),
        }
    }
}

/// Gas estimator for transactions
pub struct GasEstimator {
    /// Gas charged for a plain value transfer
    transfer_gas: U256,
}

impl GasEstimator {
    /// Create a new gas estimator
    pub fn new(transfer_gas: u64) -> Self {
        Self {
            transfer_gas: U256::from(transfer_gas),
        }
    }

    /// Fixed limits for a plain transfer (`to` set, no data), if this is one
    pub fn transfer_limits(&self, to: Option<&Address>, data: &[u8]) -> Option<GasLimits> {
        (to.is_some() && data.is_empty()).then_some(GasLimits {
            gas: self.transfer_gas,
            storage_limit: U256::zero(),
        })
    }

    /// Ask the node to simulate `request`; one round trip yields both limits
    pub async fn estimate(
        &self,
        client: &NodeClient,
        request: &TransactionPayload,
    ) -> SendResult<GasLimits> {
        let estimate = client
            .estimate_gas_and_collateral(request)
            .await
            .map_err(|e| {
                SendError::upstream(Phase::Estimation, methods::ESTIMATE_GAS_AND_COLLATERAL, e)
            })?;

        debug!(
            "Estimated gas {} and storage {}",
            estimate.gas_used, estimate.storage_collateralized
        );

        Ok(GasLimits {
            gas: estimate.gas_used,
            storage_limit: estimate.storage_collateralized,
        })
    }
}

impl Default for GasEstimator {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_TRANSFER_GAS)
    }
}
