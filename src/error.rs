//! Error types for the pool seeder

use crate::chain::RpcError;
use crate::tx::CallState;

use ethers::types::{H256, U256};
use thiserror::Error;

/// Main error type for the seeder
#[derive(Error, Debug)]
pub enum SeederError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Simulated execution failed, or the node could not estimate at all
    #[error("Gas estimation failed: {reason}")]
    Estimation { reason: String },

    /// The node refused the signed transaction before inclusion
    #[error("Transaction submission rejected: {reason}")]
    Submission { reason: String },

    /// Mined, but execution failed
    #[error("Transaction {tx_hash:?} reverted{}: gas used {gas_used}", .reason.as_ref().map(|r| format!(" ({r})")).unwrap_or_default())]
    Revert {
        tx_hash: H256,
        reason: Option<String>,
        gas_used: U256,
    },

    #[error("Timeout waiting for {operation}")]
    Timeout { operation: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Unknown token {0}")]
    UnknownToken(String),
}

impl SeederError {
    /// Terminal call state this error represents, if it ended a submitted call
    pub fn terminal_state(&self) -> Option<CallState> {
        match self {
            SeederError::Submission { .. } => Some(CallState::NetworkRejected),
            SeederError::Revert { .. } => Some(CallState::Reverted),
            _ => None,
        }
    }

    /// Whether the transaction may still land on-chain after this error
    pub fn may_be_in_flight(&self) -> bool {
        matches!(
            self,
            SeederError::Timeout { .. } | SeederError::Cancelled
        )
    }
}

impl From<ethers::abi::Error> for SeederError {
    fn from(err: ethers::abi::Error) -> Self {
        SeederError::Abi(err.to_string())
    }
}

/// Result type for seeder operations
pub type SeederResult<T> = Result<T, SeederError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revert_message_includes_reason() {
        let err = SeederError::Revert {
            tx_hash: H256::zero(),
            reason: Some("UniswapV2Router: EXPIRED".to_string()),
            gas_used: U256::from(21_000),
        };
        let msg = err.to_string();
        assert!(msg.contains("UniswapV2Router: EXPIRED"));
        assert!(msg.contains("21000"));
        assert_eq!(err.terminal_state(), Some(CallState::Reverted));
    }

    #[test]
    fn test_terminal_states() {
        let rejected = SeederError::Submission {
            reason: "nonce too low".to_string(),
        };
        assert_eq!(rejected.terminal_state(), Some(CallState::NetworkRejected));

        let timeout = SeederError::Timeout {
            operation: "receipt".to_string(),
        };
        assert_eq!(timeout.terminal_state(), None);
        assert!(timeout.may_be_in_flight());
    }
}
