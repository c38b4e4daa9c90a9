//! Compiled contract artifacts (Hardhat JSON layout)

use crate::error::{SeederError, SeederResult};
use crate::tx::CallSpec;

use ethers::abi::{Abi, Token};
use ethers::types::{Bytes, U256};
use serde::Deserialize;
use std::path::Path;

/// The subset of a Hardhat artifact needed to deploy
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    pub abi: Abi,
    /// Hex-encoded creation bytecode
    pub bytecode: String,
}

impl ContractArtifact {
    pub fn load(path: &Path) -> SeederResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SeederError::Artifact(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&raw)
            .map_err(|e| SeederError::Artifact(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(raw: &str) -> SeederResult<Self> {
        serde_json::from_str(raw).map_err(|e| SeederError::Artifact(e.to_string()))
    }

    /// Creation bytecode as bytes; fails for abstract contracts and interfaces
    pub fn creation_code(&self) -> SeederResult<Vec<u8>> {
        let code = self.bytecode.trim().trim_start_matches("0x");
        if code.is_empty() {
            return Err(SeederError::Artifact(format!(
                "{} has no bytecode",
                self.contract_name
            )));
        }
        hex::decode(code).map_err(|e| {
            SeederError::Artifact(format!("{} bytecode is not hex: {}", self.contract_name, e))
        })
    }

    /// Contract-creation call passing `initialSupply` to the constructor
    pub fn deployment_call(&self, initial_supply: U256) -> SeederResult<CallSpec> {
        let code = self.creation_code()?;
        let args = vec![Token::Uint(initial_supply)];

        let init_code = match self.abi.constructor() {
            Some(constructor) => constructor.encode_input(code, &args)?,
            None => {
                return Err(SeederError::Artifact(format!(
                    "{} has no constructor taking an initial supply",
                    self.contract_name
                )))
            }
        };

        Ok(CallSpec::create(
            self.contract_name.clone(),
            Bytes::from(init_code),
            args,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ARTIFACT: &str = r#"{
        "_format": "hh-sol-artifact-1",
        "contractName": "BTC_iCAN",
        "sourceName": "contracts/BTC_iCAN.sol",
        "abi": [
            {
                "inputs": [{ "internalType": "uint256", "name": "initialSupply", "type": "uint256" }],
                "stateMutability": "nonpayable",
                "type": "constructor"
            },
            {
                "inputs": [],
                "name": "decimals",
                "outputs": [{ "internalType": "uint8", "name": "", "type": "uint8" }],
                "stateMutability": "view",
                "type": "function"
            }
        ],
        "bytecode": "0x6080604052",
        "deployedBytecode": "0x6080"
    }"#;

    #[test]
    fn test_deployment_call_appends_constructor_args() {
        let artifact = ContractArtifact::parse(ARTIFACT).unwrap();
        assert_eq!(artifact.contract_name, "BTC_iCAN");

        let supply = U256::from(1_000_000_000_000u64);
        let call = artifact.deployment_call(supply).unwrap();

        assert!(call.to().is_none());
        assert_eq!(call.data().len(), 5 + 32);
        assert_eq!(&call.data()[..5], &[0x60, 0x80, 0x60, 0x40, 0x52]);
        assert_eq!(U256::from_big_endian(&call.data()[5..]), supply);
    }

    #[test]
    fn test_empty_bytecode_rejected() {
        let raw = ARTIFACT.replace("\"0x6080604052\"", "\"0x\"");
        let artifact = ContractArtifact::parse(&raw).unwrap();
        assert!(matches!(
            artifact.deployment_call(U256::one()),
            Err(SeederError::Artifact(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(ARTIFACT.as_bytes()).unwrap();

        let artifact = ContractArtifact::load(file.path()).unwrap();
        assert_eq!(artifact.abi.functions().count(), 1);

        let missing = ContractArtifact::load(Path::new("/nonexistent/artifact.json"));
        assert!(matches!(missing, Err(SeederError::Artifact(_))));
    }
}
