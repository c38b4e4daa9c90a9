//! Confirmation waiting for submitted transactions
//!
//! The wait is the only suspension point of a call. It is bounded by a
//! timeout and stops at the first terminal outcome:
//! - receipt with status 1 and enough confirmations: confirmed
//! - receipt with status 0: reverted, whatever block included it

use super::sender::SubmittedTransaction;
use crate::chain::NodeClient;
use crate::config::SubmissionConfig;
use crate::error::{SeederError, SeederResult};

use ethers::types::{Address, BlockId, BlockNumber, TransactionReceipt, H256, U256, U64};
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Final, successful outcome of a submitted call
#[derive(Debug, Clone)]
pub struct ConfirmedCall {
    pub submitted: SubmittedTransaction,
    pub receipt: TransactionReceipt,
}

impl ConfirmedCall {
    pub fn tx_hash(&self) -> H256 {
        self.submitted.hash
    }

    pub fn gas_used(&self) -> U256 {
        self.receipt.gas_used.unwrap_or_default()
    }

    pub fn block_number(&self) -> u64 {
        self.receipt
            .block_number
            .map(|b| b.as_u64())
            .unwrap_or_default()
    }

    /// Address created by a contract-creation transaction
    pub fn contract_address(&self) -> Option<Address> {
        self.receipt.contract_address
    }
}

/// Waits for receipts with a bounded timeout
pub struct ConfirmationWaiter {
    /// Blocks required, counting the inclusion block
    confirmations: u64,
    timeout: Duration,
    poll_interval: Duration,
}

impl ConfirmationWaiter {
    pub fn new(confirmations: u64, timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            confirmations: confirmations.max(1),
            timeout,
            poll_interval,
        }
    }

    pub fn from_config(config: &SubmissionConfig) -> Self {
        Self::new(
            config.confirmations,
            Duration::from_secs(config.confirmation_timeout_secs),
            Duration::from_millis(config.poll_interval_ms),
        )
    }

    /// Wait until the transaction is mined and confirmed, or reverted
    pub async fn wait(
        &self,
        client: &dyn NodeClient,
        submitted: &SubmittedTransaction,
    ) -> SeederResult<ConfirmedCall> {
        match timeout(self.timeout, self.poll_receipt(client, submitted)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "No receipt for {:?} after {:?}; it may still be mined",
                    submitted.hash, self.timeout
                );
                Err(SeederError::Timeout {
                    operation: format!("receipt of {:?}", submitted.hash),
                })
            }
        }
    }

    async fn poll_receipt(
        &self,
        client: &dyn NodeClient,
        submitted: &SubmittedTransaction,
    ) -> SeederResult<ConfirmedCall> {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let receipt = match client.transaction_receipt(submitted.hash).await {
                Ok(Some(receipt)) => receipt,
                Ok(None) => {
                    debug!("Transaction {:?} still pending", submitted.hash);
                    continue;
                }
                Err(e) => {
                    warn!("Receipt lookup for {:?} failed: {}", submitted.hash, e);
                    continue;
                }
            };

            let Some(included_in) = receipt.block_number else {
                debug!("Receipt for {:?} has no block yet", submitted.hash);
                continue;
            };

            if receipt.status == Some(U64::zero()) {
                return Err(self.revert_error(client, submitted, &receipt).await);
            }

            let confirmations = match self.confirmations_of(client, included_in.as_u64()).await {
                Some(confirmations) => confirmations,
                None => continue,
            };

            if confirmations < self.confirmations {
                debug!(
                    "Transaction {:?} has {} / {} confirmations",
                    submitted.hash, confirmations, self.confirmations
                );
                continue;
            }

            info!(
                "Transaction {:?} confirmed in block {} ({} gas used)",
                submitted.hash,
                included_in,
                receipt.gas_used.unwrap_or_default()
            );
            return Ok(ConfirmedCall {
                submitted: submitted.clone(),
                receipt,
            });
        }
    }

    /// Confirmations counting the inclusion block; `None` if the head is unknown
    async fn confirmations_of(&self, client: &dyn NodeClient, included_in: u64) -> Option<u64> {
        if self.confirmations <= 1 {
            return Some(1);
        }

        match client.block_number().await {
            Ok(head) => Some(head.saturating_sub(included_in) + 1),
            Err(e) => {
                warn!("Block number lookup failed: {}", e);
                None
            }
        }
    }

    /// Build the revert error, replaying the call for its reason
    async fn revert_error(
        &self,
        client: &dyn NodeClient,
        submitted: &SubmittedTransaction,
        receipt: &TransactionReceipt,
    ) -> SeederError {
        let gas_used = receipt.gas_used.unwrap_or_default();
        let replay_block = receipt
            .block_number
            .map(|b| b.as_u64().saturating_sub(1))
            .unwrap_or_default();

        let mut request = submitted.call.simulation_request(Some(submitted.from));
        request.set_gas(submitted.gas_limit);

        let reason = match client
            .call(&request, Some(BlockId::Number(BlockNumber::Number(replay_block.into()))))
            .await
        {
            Ok(_) => None,
            Err(e) => Some(e.reason()),
        };

        warn!(
            "Transaction {:?} reverted in block {}: {}",
            submitted.hash,
            replay_block + 1,
            reason.as_deref().unwrap_or("no reason")
        );

        SeederError::Revert {
            tx_hash: submitted.hash,
            reason,
            gas_used,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{MockNodeClient, RpcError};
    use crate::testing::{receipt, revert_payload, submitted_approve};
    use ethers::types::Bytes;
    use mockall::Sequence;

    fn waiter(confirmations: u64) -> ConfirmationWaiter {
        ConfirmationWaiter::new(
            confirmations,
            Duration::from_secs(30),
            Duration::from_millis(500),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirms_after_pending_polls() {
        let submitted = submitted_approve(H256::repeat_byte(0x01));
        let hash = submitted.hash;

        let mut seq = Sequence::new();
        let mut client = MockNodeClient::new();
        client
            .expect_transaction_receipt()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        client
            .expect_transaction_receipt()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(Some(receipt(hash, 12, 1, 46_000))));

        let confirmed = waiter(1).wait(&client, &submitted).await.unwrap();
        assert_eq!(confirmed.tx_hash(), hash);
        assert_eq!(confirmed.block_number(), 12);
        assert_eq!(confirmed.gas_used(), U256::from(46_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_included_but_failed_is_revert() {
        let submitted = submitted_approve(H256::repeat_byte(0x02));
        let hash = submitted.hash;

        let mut client = MockNodeClient::new();
        client
            .expect_transaction_receipt()
            .returning(move |_| Ok(Some(receipt(hash, 20, 0, 30_000))));
        client
            .expect_call()
            .withf(|_, block| {
                *block == Some(BlockId::Number(BlockNumber::Number(19u64.into())))
            })
            .times(1)
            .returning(|_, _| {
                Err(RpcError::new("eth_call", "execution reverted")
                    .with_revert_data(Bytes::from(revert_payload("UniswapV2Router: EXPIRED"))))
            });

        let err = waiter(1).wait(&client, &submitted).await.unwrap_err();
        match err {
            SeederError::Revert {
                tx_hash,
                reason,
                gas_used,
            } => {
                assert_eq!(tx_hash, hash);
                assert_eq!(reason.as_deref(), Some("UniswapV2Router: EXPIRED"));
                assert_eq!(gas_used, U256::from(30_000));
            }
            other => panic!("expected revert, got {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_mined_times_out() {
        let submitted = submitted_approve(H256::repeat_byte(0x03));

        let mut client = MockNodeClient::new();
        client.expect_transaction_receipt().returning(|_| Ok(None));

        let err = waiter(1).wait(&client, &submitted).await.unwrap_err();
        assert!(matches!(err, SeederError::Timeout { .. }));
        assert!(err.may_be_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_failures_keep_waiting() {
        let submitted = submitted_approve(H256::repeat_byte(0x04));
        let hash = submitted.hash;

        let mut seq = Sequence::new();
        let mut client = MockNodeClient::new();
        client
            .expect_transaction_receipt()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(RpcError::new("eth_getTransactionReceipt", "connection reset")));
        client
            .expect_transaction_receipt()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(Some(receipt(hash, 5, 1, 21_000))));

        tokio_test::assert_ok!(waiter(1).wait(&client, &submitted).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_required_confirmations() {
        let submitted = submitted_approve(H256::repeat_byte(0x05));
        let hash = submitted.hash;

        let mut seq = Sequence::new();
        let mut client = MockNodeClient::new();
        client
            .expect_transaction_receipt()
            .returning(move |_| Ok(Some(receipt(hash, 100, 1, 21_000))));
        client
            .expect_block_number()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(101));
        client
            .expect_block_number()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(102));

        let confirmed = waiter(3).wait(&client, &submitted).await.unwrap();
        assert_eq!(confirmed.block_number(), 100);
    }
}
