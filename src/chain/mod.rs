//! Chain module - the JSON-RPC boundary
//!
//! This module provides:
//! - The `NodeClient` trait every workflow step talks to
//! - An ethers-backed `ChainProvider` with read-path failover
//! - Revert payload decoding shared by estimation and confirmation

pub mod provider;

pub use provider::ChainProvider;

use async_trait::async_trait;
use ethers::abi::{self, ParamType, Token};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, BlockId, Bytes, FeeHistory, TransactionReceipt, H256, U256};
use thiserror::Error;

/// `Error(string)` selector
const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
/// `Panic(uint256)` selector
const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// A failed JSON-RPC request
#[derive(Error, Debug, Clone)]
#[error("{method} failed: {message}")]
pub struct RpcError {
    /// JSON-RPC method name
    pub method: &'static str,
    pub message: String,
    /// Raw revert payload, when the node returned one
    pub revert_data: Option<Bytes>,
}

impl RpcError {
    pub fn new(method: &'static str, message: impl Into<String>) -> Self {
        Self {
            method,
            message: message.into(),
            revert_data: None,
        }
    }

    pub fn with_revert_data(mut self, data: Bytes) -> Self {
        self.revert_data = Some(data);
        self
    }

    /// Human-readable revert reason, falling back to the node's message
    pub fn reason(&self) -> String {
        self.revert_data
            .as_ref()
            .and_then(|data| decode_revert_reason(data))
            .unwrap_or_else(|| self.message.clone())
    }
}

/// Decode a Solidity revert payload into a readable reason.
///
/// Handles `Error(string)` and `Panic(uint256)`; anything else is rendered as
/// hex so custom errors are at least visible in logs.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    if data.len() < 4 {
        return None;
    }
    let (selector, payload) = data.split_at(4);

    if selector == ERROR_SELECTOR {
        return match abi::decode(&[ParamType::String], payload) {
            Ok(tokens) => match tokens.into_iter().next() {
                Some(Token::String(reason)) => Some(reason),
                _ => None,
            },
            Err(_) => None,
        };
    }

    if selector == PANIC_SELECTOR {
        return match abi::decode(&[ParamType::Uint(256)], payload) {
            Ok(tokens) => match tokens.into_iter().next() {
                Some(Token::Uint(code)) => Some(format!("Panic({:#x})", code)),
                _ => None,
            },
            Err(_) => None,
        };
    }

    Some(format!("0x{}", hex::encode(data)))
}

/// Execution-layer node operations used by the submission workflow
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Chain ID the client is bound to
    fn chain_id(&self) -> u64;

    async fn block_number(&self) -> Result<u64, RpcError>;

    /// `eth_estimateGas` for a fully-populated call
    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256, RpcError>;

    /// `eth_gasPrice`
    async fn gas_price(&self) -> Result<U256, RpcError>;

    /// `eth_feeHistory` ending at the latest block
    async fn fee_history(
        &self,
        block_count: u64,
        reward_percentiles: &[f64],
    ) -> Result<FeeHistory, RpcError>;

    /// Pending nonce for an account
    async fn transaction_count(&self, address: Address) -> Result<U256, RpcError>;

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256, RpcError>;

    async fn transaction_receipt(
        &self,
        tx_hash: H256,
    ) -> Result<Option<TransactionReceipt>, RpcError>;

    /// `eth_call`; a revert comes back as an `RpcError` carrying revert data
    async fn call(&self, tx: &TypedTransaction, block: Option<BlockId>)
        -> Result<Bytes, RpcError>;

    async fn balance(&self, address: Address) -> Result<U256, RpcError>;
}
