//! Token deployment from compiled artifacts

use super::WorkflowContext;
use crate::config::TokenConfig;
use crate::contracts::{display_amount, ContractArtifact};
use crate::error::{SeederError, SeederResult};

use ethers::types::{Address, H256, U256};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedToken {
    pub name: String,
    pub address: Address,
    pub tx_hash: H256,
    pub block_number: u64,
}

/// Deploy `name` with its configured initial supply and report the address
pub async fn deploy_token(
    ctx: WorkflowContext<'_>,
    name: &str,
    token: &TokenConfig,
) -> SeederResult<DeployedToken> {
    let artifact_path = token.artifact.as_ref().ok_or_else(|| {
        SeederError::Configuration(format!("Token {} has no artifact configured", name))
    })?;
    let initial_supply = token.constructor_supply()?.ok_or_else(|| {
        SeederError::Configuration(format!("Token {} has no initial_supply", name))
    })?;

    let artifact = ContractArtifact::load(artifact_path)?;
    deploy_artifact(ctx, name, &artifact, initial_supply, token.decimals).await
}

pub async fn deploy_artifact(
    ctx: WorkflowContext<'_>,
    name: &str,
    artifact: &ContractArtifact,
    initial_supply: U256,
    decimals: u32,
) -> SeederResult<DeployedToken> {
    info!(
        "Deploying {} ({}) with initial supply {}",
        name,
        artifact.contract_name,
        display_amount(initial_supply, decimals)
    );

    let call = artifact.deployment_call(initial_supply)?;
    let confirmed = ctx
        .pipeline
        .execute(ctx.client, ctx.account, call, None)
        .await?;

    let address = confirmed.contract_address().ok_or_else(|| {
        SeederError::Artifact(format!(
            "Receipt {:?} for {} carries no contract address",
            confirmed.tx_hash(),
            name
        ))
    })?;

    info!("{} deployed to {:?}", name, address);

    Ok(DeployedToken {
        name: name.to_string(),
        address,
        tx_hash: confirmed.tx_hash(),
        block_number: confirmed.block_number(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockNodeClient;
    use crate::config::FeeModel;
    use crate::testing::{dev_account, gwei, receipt};
    use crate::tx::{ConfirmationWaiter, GasBuffer, GasEstimator, TransactionPipeline};
    use ethers::types::transaction::eip2718::TypedTransaction;
    use ethers::types::Bytes;
    use ethers::utils::rlp::Rlp;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const ARTIFACT: &str = r#"{
        "contractName": "USDC_iCAN",
        "abi": [
            {
                "inputs": [{ "internalType": "uint256", "name": "initialSupply", "type": "uint256" }],
                "stateMutability": "nonpayable",
                "type": "constructor"
            }
        ],
        "bytecode": "0x60806040"
    }"#;

    fn pipeline() -> TransactionPipeline {
        TransactionPipeline::new(
            GasEstimator::new(FeeModel::Legacy, gwei(500), gwei(2)),
            ConfirmationWaiter::new(1, Duration::from_secs(60), Duration::from_millis(100)),
            GasBuffer::Percent(10),
        )
    }

    fn token_config(artifact: Option<std::path::PathBuf>) -> TokenConfig {
        TokenConfig {
            address: None,
            decimals: 18,
            initial_supply: Some("1000000000000000000000000".to_string()),
            artifact,
            approve_amount: None,
            gas_buffer: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deploy_reports_created_address() {
        let deployed_at = Address::repeat_byte(0x5c);

        let mut client = MockNodeClient::new();
        client
            .expect_estimate_gas()
            .withf(|tx| tx.to().is_none())
            .returning(|_| Ok(U256::from(1_200_000)));
        client.expect_gas_price().returning(|| Ok(gwei(1)));
        client
            .expect_transaction_count()
            .returning(|_| Ok(U256::zero()));
        let sent: Arc<Mutex<Vec<Bytes>>> = Arc::default();
        let captured = sent.clone();
        client.expect_send_raw_transaction().returning(move |raw| {
            captured.lock().unwrap().push(raw);
            Ok(H256::repeat_byte(0xd0))
        });
        client.expect_transaction_receipt().returning(move |hash| {
            let mut receipt = receipt(hash, 4, 1, 1_100_000);
            receipt.contract_address = Some(deployed_at);
            Ok(Some(receipt))
        });

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ARTIFACT.as_bytes()).unwrap();

        let account = dev_account();
        let pipeline = pipeline();
        let ctx = WorkflowContext::new(&client, &account, &pipeline);

        let deployed = deploy_token(ctx, "USDC_iCAN", &token_config(Some(file.path().into())))
            .await
            .unwrap();

        assert_eq!(deployed.address, deployed_at);
        assert_eq!(deployed.tx_hash, H256::repeat_byte(0xd0));
        assert_eq!(deployed.block_number, 4);

        // constructor argument wider than 64 bits reaches the init code intact
        let raw = sent.lock().unwrap()[0].clone();
        let (tx, _) = TypedTransaction::decode_signed(&Rlp::new(raw.as_ref())).unwrap();
        let data = tx.data().unwrap();
        assert_eq!(U256::from_big_endian(&data[data.len() - 32..]), U256::exp10(24));
    }

    #[tokio::test]
    async fn test_missing_artifact_is_configuration_error() {
        let client = MockNodeClient::new();
        let account = dev_account();
        let pipeline = pipeline();
        let ctx = WorkflowContext::new(&client, &account, &pipeline);

        let err = deploy_token(ctx, "BTC_iCAN", &token_config(None))
            .await
            .unwrap_err();
        assert!(matches!(err, SeederError::Configuration(_)));
    }
}
