//! Read-only fee market report

use crate::chain::NodeClient;
use crate::error::SeederResult;
use crate::tx::{GasEstimator, GasPrice};

use ethers::types::U256;
use ethers::utils::format_units;
use std::fmt;
use tracing::{info, warn};

const HISTORY_BLOCKS: u64 = 5;
const REWARD_PERCENTILES: [f64; 3] = [25.0, 50.0, 75.0];

#[derive(Debug, Clone, PartialEq)]
pub struct FeeReport {
    pub block_number: u64,
    pub gas_price: U256,
    /// Base fee of the next block, absent on pre-London chains
    pub next_base_fee: Option<U256>,
    /// Median priority fee per sampled block
    pub median_rewards: Vec<U256>,
    /// Fees the estimator would submit with right now
    pub resolved: GasPrice,
}

impl fmt::Display for FeeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block {}: gas price {} gwei", self.block_number, gwei(self.gas_price))?;
        if let Some(base_fee) = self.next_base_fee {
            write!(f, ", next base fee {} gwei", gwei(base_fee))?;
        }
        match self.resolved {
            GasPrice::Legacy(price) => write!(f, ", would submit legacy at {} gwei", gwei(price)),
            GasPrice::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => write!(
                f,
                ", would submit max fee {} gwei / priority {} gwei",
                gwei(max_fee_per_gas),
                gwei(max_priority_fee_per_gas)
            ),
        }
    }
}

fn gwei(wei: U256) -> String {
    format_units(wei, "gwei").unwrap_or_else(|_| wei.to_string())
}

/// Snapshot the fee market as seen by `estimator`
pub async fn fee_report(client: &dyn NodeClient, estimator: &GasEstimator) -> SeederResult<FeeReport> {
    let block_number = client.block_number().await?;
    let gas_price = client.gas_price().await?;

    let (next_base_fee, median_rewards) =
        match client.fee_history(HISTORY_BLOCKS, &REWARD_PERCENTILES).await {
            Ok(history) => (
                history.base_fee_per_gas.last().copied().filter(|fee| !fee.is_zero()),
                history
                    .reward
                    .iter()
                    .filter_map(|rewards| rewards.get(1).copied())
                    .collect(),
            ),
            Err(e) => {
                warn!("Fee history unavailable: {}", e);
                (None, Vec::new())
            }
        };

    let resolved = estimator.get_gas_price(client).await?;

    let report = FeeReport {
        block_number,
        gas_price,
        next_base_fee,
        median_rewards,
        resolved,
    };
    info!("{}", report);
    Ok(report)
}
