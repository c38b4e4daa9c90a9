//! Shared fixtures for unit tests

use crate::account::AccountContext;
use crate::tx::{CallSpec, GasPrice, SubmittedTransaction};

use ethers::abi::{self, Token};
use ethers::types::{Address, TransactionReceipt, H256, U256, U64};

/// First well-known development key of local test nodes
pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const DEV_CHAIN_ID: u64 = 31337;

pub fn dev_account() -> AccountContext {
    AccountContext::from_private_key(DEV_KEY, DEV_CHAIN_ID).unwrap()
}

pub fn gwei(n: u64) -> U256 {
    U256::from(n) * U256::exp10(9)
}

pub fn approve_spec() -> CallSpec {
    CallSpec::new(
        Address::repeat_byte(0x01),
        "function approve(address spender, uint256 amount) external returns (bool)",
        vec![Token::Address(Address::repeat_byte(0x02)), Token::Uint(U256::one())],
    )
    .unwrap()
}

pub fn submitted_approve(hash: H256) -> SubmittedTransaction {
    SubmittedTransaction {
        hash,
        nonce: U256::zero(),
        from: dev_account().address(),
        call: approve_spec(),
        gas_limit: U256::from(60_000),
        fee: GasPrice::Legacy(gwei(20)),
    }
}

pub fn receipt(hash: H256, block: u64, status: u64, gas_used: u64) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: hash,
        block_number: Some(U64::from(block)),
        status: Some(U64::from(status)),
        gas_used: Some(U256::from(gas_used)),
        ..Default::default()
    }
}

/// `Error(string)` revert payload
pub fn revert_payload(reason: &str) -> Vec<u8> {
    let mut data = vec![0x08, 0xc3, 0x79, 0xa0];
    data.extend(abi::encode(&[Token::String(reason.to_string())]));
    data
}
