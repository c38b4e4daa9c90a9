//! Transaction sender: nonce lookup, typed transaction construction, signing
//! and broadcast

use super::call::CallSpec;
use super::gas::GasPrice;
use crate::account::AccountContext;
use crate::chain::NodeClient;
use crate::error::{SeederError, SeederResult};

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Eip1559TransactionRequest, TransactionRequest, H256, U256};
use tracing::{debug, info, warn};

/// A broadcast transaction awaiting inclusion
#[derive(Debug, Clone)]
pub struct SubmittedTransaction {
    pub hash: H256,
    pub nonce: U256,
    pub from: Address,
    pub call: CallSpec,
    pub gas_limit: U256,
    pub fee: GasPrice,
}

/// Signs and broadcasts transactions for an explicitly passed account
#[derive(Debug, Default, Clone, Copy)]
pub struct TransactionSender;

impl TransactionSender {
    pub fn new() -> Self {
        Self
    }

    /// Sign and broadcast a call with a padded gas limit and resolved fees
    pub async fn submit(
        &self,
        client: &dyn NodeClient,
        account: &AccountContext,
        call: &CallSpec,
        gas_limit: U256,
        fee: GasPrice,
    ) -> SeederResult<SubmittedTransaction> {
        let from = account.address();
        // nothing has been signed yet, so a failed lookup rejects the call outright
        let nonce = client.transaction_count(from).await.map_err(|e| {
            warn!("Pending nonce lookup for {:?} failed: {}", from, e);
            SeederError::Submission { reason: e.reason() }
        })?;

        let tx = Self::build_transaction(call, from, nonce, gas_limit, &fee, account.chain_id());

        let signature = account.sign(&tx).await?;
        let signed_tx = tx.rlp_signed(&signature);

        let hash = client
            .send_raw_transaction(signed_tx)
            .await
            .map_err(|e| {
                let reason = e.reason();
                if reason.contains("nonce too low") {
                    warn!("Nonce {} for {:?} already used", nonce, from);
                } else if reason.contains("insufficient funds") {
                    warn!("Account {:?} cannot cover gas for {}", from, call);
                } else if reason.contains("underpriced") {
                    warn!("Transaction for {} underpriced at {:?}", call, fee);
                }
                SeederError::Submission { reason }
            })?;

        let local_hash = tx.hash(&signature);
        if local_hash != hash {
            debug!(
                "Node returned hash {:?}, locally computed {:?}",
                hash, local_hash
            );
        }

        info!(
            "Transaction sent: {:?} (nonce {}, gas limit {})",
            hash, nonce, gas_limit
        );

        Ok(SubmittedTransaction {
            hash,
            nonce,
            from,
            call: call.clone(),
            gas_limit,
            fee,
        })
    }

    /// Build a typed transaction; the fee enum selects the envelope
    pub fn build_transaction(
        call: &CallSpec,
        from: Address,
        nonce: U256,
        gas_limit: U256,
        gas_price: &GasPrice,
        chain_id: u64,
    ) -> TypedTransaction {
        match gas_price {
            GasPrice::Legacy(price) => {
                let mut tx = TransactionRequest::new()
                    .from(from)
                    .data(call.data().clone())
                    .value(call.value())
                    .nonce(nonce)
                    .gas(gas_limit)
                    .gas_price(*price)
                    .chain_id(chain_id);
                if let Some(to) = call.to() {
                    tx = tx.to(to);
                }
                TypedTransaction::Legacy(tx)
            }
            GasPrice::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => {
                let mut tx = Eip1559TransactionRequest::new()
                    .from(from)
                    .data(call.data().clone())
                    .value(call.value())
                    .nonce(nonce)
                    .gas(gas_limit)
                    .max_fee_per_gas(*max_fee_per_gas)
                    .max_priority_fee_per_gas(*max_priority_fee_per_gas)
                    .chain_id(chain_id);
                if let Some(to) = call.to() {
                    tx = tx.to(to);
                }
                TypedTransaction::Eip1559(tx)
            }
        }
    }
}
