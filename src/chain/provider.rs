//! Chain provider with multi-RPC support and read-path failover

use super::{NodeClient, RpcError};
use crate::config::NetworkConfig;
use crate::error::{SeederError, SeederResult};

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError as _};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, BlockId, BlockNumber, Bytes, FeeHistory, TransactionReceipt, H256, U256,
};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Multi-provider wrapper with automatic failover for reads
///
/// Writes (`eth_sendRawTransaction`) and simulations (`eth_estimateGas`,
/// `eth_call`) go to the active provider only; a revert there is an answer,
/// not a transport failure.
pub struct ChainProvider {
    /// Network configuration
    config: NetworkConfig,
    /// HTTP providers (multiple for failover)
    http_providers: Vec<Provider<Http>>,
    /// Current active provider index
    current_provider: AtomicUsize,
}

impl ChainProvider {
    /// Create a chain provider and verify the node serves the configured chain
    pub async fn connect(config: NetworkConfig) -> SeederResult<Self> {
        let provider = Self::new(config)?;

        let remote_chain_id = provider
            .with_failover("eth_chainId", |p| p.get_chainid())
            .await?
            .as_u64();

        if remote_chain_id != provider.config.chain_id {
            return Err(SeederError::Configuration(format!(
                "Network {} expects chain ID {}, node reports {}",
                provider.config.name, provider.config.chain_id, remote_chain_id
            )));
        }

        info!(
            "Connected to {} (chain ID {})",
            provider.config.name, remote_chain_id
        );
        Ok(provider)
    }

    /// Create a chain provider without contacting the node
    pub fn new(config: NetworkConfig) -> SeederResult<Self> {
        let mut http_providers = Vec::new();

        for url in config.rpc_urls.iter().filter(|u| !u.trim().is_empty()) {
            match Provider::<Http>::try_from(url.as_str()) {
                Ok(provider) => {
                    let provider = provider.interval(Duration::from_millis(100));
                    http_providers.push(provider);
                    debug!("Added HTTP provider for {}: {}", config.name, url);
                }
                Err(e) => {
                    warn!("Failed to create provider for {}: {}", url, e);
                }
            }
        }

        if http_providers.is_empty() {
            return Err(SeederError::Configuration(format!(
                "No valid RPC providers for network {}",
                config.name
            )));
        }

        Ok(Self {
            config,
            http_providers,
            current_provider: AtomicUsize::new(0),
        })
    }

    /// Get the active HTTP provider
    pub fn http(&self) -> &Provider<Http> {
        let idx = self.current_provider.load(Ordering::Relaxed);
        &self.http_providers[idx % self.http_providers.len()]
    }

    /// Switch to next available provider
    pub fn failover(&self) {
        let current = self.current_provider.load(Ordering::Relaxed);
        let next = (current + 1) % self.http_providers.len();
        self.current_provider.store(next, Ordering::Relaxed);
        warn!("Network {} failover to provider {}", self.config.name, next);
    }

    /// Run a read request, rotating through providers on failure
    async fn with_failover<'a, T, F, Fut>(&'a self, method: &'static str, f: F) -> Result<T, RpcError>
    where
        F: Fn(&'a Provider<Http>) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut last_error = None;

        for _ in 0..self.http_providers.len() {
            match f(self.http()).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!("{} failed on network {}: {}", method, self.config.name, e);
                    last_error = Some(e);
                    self.failover();
                }
            }
        }

        Err(RpcError::new(
            method,
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "All providers failed".to_string()),
        ))
    }
}

/// Convert an ethers provider error, keeping any revert payload
fn rpc_error(method: &'static str, err: ProviderError) -> RpcError {
    let revert_data = err
        .as_error_response()
        .and_then(|response| response.as_revert_data());

    let error = RpcError::new(method, err.to_string());
    match revert_data {
        Some(data) => error.with_revert_data(data),
        None => error,
    }
}

#[async_trait]
impl NodeClient for ChainProvider {
    fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    async fn block_number(&self) -> Result<u64, RpcError> {
        self.with_failover("eth_blockNumber", |p| p.get_block_number())
            .await
            .map(|n| n.as_u64())
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256, RpcError> {
        self.http()
            .estimate_gas(tx, None)
            .await
            .map_err(|e| rpc_error("eth_estimateGas", e))
    }

    async fn gas_price(&self) -> Result<U256, RpcError> {
        self.with_failover("eth_gasPrice", |p| p.get_gas_price()).await
    }

    async fn fee_history(
        &self,
        block_count: u64,
        reward_percentiles: &[f64],
    ) -> Result<FeeHistory, RpcError> {
        self.with_failover("eth_feeHistory", |p| {
            p.fee_history(block_count, BlockNumber::Latest, reward_percentiles)
        })
        .await
    }

    async fn transaction_count(&self, address: Address) -> Result<U256, RpcError> {
        self.with_failover("eth_getTransactionCount", |p| {
            p.get_transaction_count(address, Some(BlockId::Number(BlockNumber::Pending)))
        })
        .await
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256, RpcError> {
        self.http()
            .send_raw_transaction(raw)
            .await
            .map(|pending| pending.tx_hash())
            .map_err(|e| rpc_error("eth_sendRawTransaction", e))
    }

    async fn transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> Result<Option<TransactionReceipt>, RpcError> {
        self.with_failover("eth_getTransactionReceipt", |p| {
            p.get_transaction_receipt(tx_hash)
        })
        .await
    }

    async fn call(
        &self,
        tx: &TypedTransaction,
        block: Option<BlockId>,
    ) -> Result<Bytes, RpcError> {
        self.http()
            .call(tx, block)
            .await
            .map_err(|e| rpc_error("eth_call", e))
    }

    async fn balance(&self, address: Address) -> Result<U256, RpcError> {
        self.with_failover("eth_getBalance", |p| p.get_balance(address, None))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeeModel;

    fn network(urls: &[&str]) -> NetworkConfig {
        NetworkConfig {
            name: "localhost".to_string(),
            chain_id: 31337,
            rpc_urls: urls.iter().map(|u| u.to_string()).collect(),
            fee_model: FeeModel::Legacy,
            max_gas_price_gwei: 500,
            default_priority_fee_gwei: 2,
        }
    }

    #[test]
    fn test_failover_rotates_providers() {
        let provider =
            ChainProvider::new(network(&["http://127.0.0.1:8545", "http://127.0.0.1:8546"]))
                .unwrap();
        assert_eq!(provider.current_provider.load(Ordering::Relaxed), 0);

        provider.failover();
        assert_eq!(provider.current_provider.load(Ordering::Relaxed), 1);

        provider.failover();
        assert_eq!(provider.current_provider.load(Ordering::Relaxed), 0);
        assert_eq!(provider.chain_id(), 31337);
    }

    #[test]
    fn test_invalid_urls_are_configuration_error() {
        let result = ChainProvider::new(network(&["not a url", ""]));
        assert!(matches!(result, Err(SeederError::Configuration(_))));
    }
}
