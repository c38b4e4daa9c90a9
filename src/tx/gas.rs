//! Gas estimation and fee resolution for legacy and EIP-1559 networks

use super::call::CallSpec;
use crate::account::AccountContext;
use crate::chain::NodeClient;
use crate::config::{FeeModel, NetworkConfig};
use crate::error::{SeederError, SeederResult};

use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

const GWEI: u64 = 1_000_000_000;

/// Reward percentile sampled from fee history for the priority fee
const PRIORITY_FEE_PERCENTILE: f64 = 50.0;

/// Padding added on top of a raw gas estimate
///
/// Only ever adds: `apply(estimate) >= estimate` for every policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GasBuffer {
    /// Flat number of gas units
    Fixed(u64),
    /// Percentage of the estimate
    Percent(u64),
}

impl GasBuffer {
    /// Padded gas limit for an estimate
    pub fn apply(&self, estimate: U256) -> U256 {
        let buffer = match self {
            GasBuffer::Fixed(units) => U256::from(*units),
            GasBuffer::Percent(percent) => estimate.saturating_mul(U256::from(*percent)) / 100,
        };
        estimate.saturating_add(buffer)
    }
}

impl fmt::Display for GasBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GasBuffer::Fixed(units) => write!(f, "+{} gas", units),
            GasBuffer::Percent(percent) => write!(f, "+{}%", percent),
        }
    }
}

/// Gas price types
///
/// A submission carries exactly one of these, so legacy and EIP-1559 fields
/// can never be mixed on the same transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasPrice {
    Legacy(U256),
    Eip1559 {
        max_fee_per_gas: U256,
        max_priority_fee_per_gas: U256,
    },
}

/// Estimated gas units plus the fee market snapshot taken alongside it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    pub fee: GasPrice,
    pub estimated_gas: U256,
}

impl FeeQuote {
    /// Gas limit to submit with, padded by the given policy
    pub fn gas_limit(&self, buffer: GasBuffer) -> U256 {
        buffer.apply(self.estimated_gas)
    }
}

/// Gas estimator for transactions
pub struct GasEstimator {
    fee_model: FeeModel,
    /// Ceiling for gas price / max fee per gas, in wei
    max_gas_price: U256,
    /// Priority fee used when fee history carries no rewards, in wei
    default_priority_fee: U256,
}

impl GasEstimator {
    pub fn new(fee_model: FeeModel, max_gas_price: U256, default_priority_fee: U256) -> Self {
        Self {
            fee_model,
            max_gas_price,
            default_priority_fee,
        }
    }

    /// Create an estimator from network settings
    pub fn from_config(config: &NetworkConfig) -> Self {
        Self::new(
            config.fee_model,
            U256::from(config.max_gas_price_gwei) * U256::from(GWEI),
            U256::from(config.default_priority_fee_gwei) * U256::from(GWEI),
        )
    }

    /// Estimate gas for a call and snapshot the current fee market.
    ///
    /// Both parts are fetched fresh on every call.
    pub async fn estimate(
        &self,
        client: &dyn NodeClient,
        account: &AccountContext,
        call: &CallSpec,
    ) -> SeederResult<FeeQuote> {
        let request = call.simulation_request(Some(account.address()));
        let estimated_gas = client
            .estimate_gas(&request)
            .await
            .map_err(|e| SeederError::Estimation { reason: e.reason() })?;

        let fee = self.get_gas_price(client).await?;

        debug!("Estimated {} gas for {} at {:?}", estimated_gas, call, fee);
        Ok(FeeQuote { fee, estimated_gas })
    }

    /// Current fee parameters for the configured fee model
    pub async fn get_gas_price(&self, client: &dyn NodeClient) -> SeederResult<GasPrice> {
        match self.fee_model {
            FeeModel::Legacy => {
                let price = client
                    .gas_price()
                    .await
                    .map_err(|e| SeederError::Estimation { reason: e.reason() })?;

                if price > self.max_gas_price {
                    return Err(SeederError::Estimation {
                        reason: format!(
                            "gas price {} exceeds ceiling {}",
                            price, self.max_gas_price
                        ),
                    });
                }
                Ok(GasPrice::Legacy(price))
            }
            FeeModel::Eip1559 => self.estimate_eip1559_fees(client).await,
        }
    }

    /// Estimate EIP-1559 fees from the latest fee history
    async fn estimate_eip1559_fees(&self, client: &dyn NodeClient) -> SeederResult<GasPrice> {
        let history = client
            .fee_history(1, &[PRIORITY_FEE_PERCENTILE])
            .await
            .map_err(|e| SeederError::Estimation { reason: e.reason() })?;

        // The last entry is the base fee of the next block
        let base_fee = history
            .base_fee_per_gas
            .last()
            .copied()
            .ok_or_else(|| SeederError::Estimation {
                reason: "fee history carries no base fee".to_string(),
            })?;

        let priority_fee = history
            .reward
            .last()
            .and_then(|rewards| rewards.first())
            .copied()
            .filter(|reward| !reward.is_zero())
            .unwrap_or(self.default_priority_fee);

        // Max fee = 2 * base_fee + priority_fee (buffer for block variability)
        let max_fee = base_fee.saturating_mul(U256::from(2)).saturating_add(priority_fee);

        if base_fee > self.max_gas_price {
            return Err(SeederError::Estimation {
                reason: format!(
                    "base fee {} exceeds ceiling {}",
                    base_fee, self.max_gas_price
                ),
            });
        }

        // Cap at configured max
        let max_fee = std::cmp::min(max_fee, self.max_gas_price);
        let priority_fee = std::cmp::min(priority_fee, max_fee);

        Ok(GasPrice::Eip1559 {
            max_fee_per_gas: max_fee,
            max_priority_fee_per_gas: priority_fee,
        })
    }

    /// Calculate worst-case total cost in wei
    pub fn calculate_cost(gas_limit: U256, gas_price: &GasPrice) -> U256 {
        match gas_price {
            GasPrice::Legacy(price) => gas_limit.saturating_mul(*price),
            GasPrice::Eip1559 {
                max_fee_per_gas, ..
            } => gas_limit.saturating_mul(*max_fee_per_gas),
        }
    }
}
