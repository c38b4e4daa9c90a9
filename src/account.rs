//! Acting account passed explicitly through every workflow step

use crate::error::{SeederError, SeederResult};

use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Signature};
use std::fmt;

/// Signing account bound to one chain
#[derive(Clone)]
pub struct AccountContext {
    wallet: LocalWallet,
}

impl AccountContext {
    pub fn new(wallet: LocalWallet, chain_id: u64) -> Self {
        Self {
            wallet: wallet.with_chain_id(chain_id),
        }
    }

    /// Parse a hex private key (with or without `0x`)
    pub fn from_private_key(key: &str, chain_id: u64) -> SeederResult<Self> {
        let wallet = key
            .trim()
            .parse::<LocalWallet>()
            .map_err(|e| SeederError::Wallet(format!("Invalid private key: {}", e)))?;
        Ok(Self::new(wallet, chain_id))
    }

    /// Load the key from the named environment variable
    pub fn from_env(var: &str, chain_id: u64) -> SeederResult<Self> {
        let key = std::env::var(var).map_err(|_| {
            SeederError::Configuration(format!(
                "No wallet configured. Set {} to the signer's private key",
                var
            ))
        })?;
        Self::from_private_key(&key, chain_id)
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.wallet.chain_id()
    }

    pub async fn sign(&self, tx: &TypedTransaction) -> SeederResult<Signature> {
        self.wallet
            .sign_transaction(tx)
            .await
            .map_err(|e| SeederError::Wallet(format!("Signing failed: {}", e)))
    }
}

impl fmt::Debug for AccountContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountContext")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::DEV_KEY;

    #[test]
    fn test_from_private_key() {
        let account = AccountContext::from_private_key(DEV_KEY, 31337).unwrap();
        assert_eq!(
            account.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                .parse::<Address>()
                .unwrap()
        );
        assert_eq!(account.chain_id(), 31337);
        assert!(!format!("{:?}", account).contains("ac0974"));
    }

    #[test]
    fn test_missing_env_is_configuration_error() {
        std::env::remove_var("SEEDER_TEST_MISSING_KEY");
        let err = AccountContext::from_env("SEEDER_TEST_MISSING_KEY", 1).unwrap_err();
        assert!(matches!(err, SeederError::Configuration(_)));
    }

    #[test]
    fn test_invalid_key_is_wallet_error() {
        let err = AccountContext::from_private_key("0x1234", 1).unwrap_err();
        assert!(matches!(err, SeederError::Wallet(_)));
    }
}
