//! ERC-20 calls: approve, allowance, balanceOf

use crate::chain::NodeClient;
use crate::error::{SeederError, SeederResult};
use crate::tx::CallSpec;

use ethers::abi::Token;
use ethers::types::{Address, U256};

pub const APPROVE: &str =
    "function approve(address spender, uint256 amount) external returns (bool)";
pub const ALLOWANCE: &str =
    "function allowance(address owner, address spender) external view returns (uint256)";
pub const BALANCE_OF: &str = "function balanceOf(address owner) external view returns (uint256)";

/// `approve(spender, amount)` on `token`
pub fn approve(token: Address, spender: Address, amount: U256) -> SeederResult<CallSpec> {
    CallSpec::new(
        token,
        APPROVE,
        vec![Token::Address(spender), Token::Uint(amount)],
    )
}

/// Current allowance granted by `owner` to `spender`
pub async fn allowance(
    client: &dyn NodeClient,
    token: Address,
    owner: Address,
    spender: Address,
) -> SeederResult<U256> {
    let call = CallSpec::new(
        token,
        ALLOWANCE,
        vec![Token::Address(owner), Token::Address(spender)],
    )?;
    single_uint(call.read(client, Some(owner)).await?, "allowance")
}

pub async fn balance_of(
    client: &dyn NodeClient,
    token: Address,
    owner: Address,
) -> SeederResult<U256> {
    let call = CallSpec::new(token, BALANCE_OF, vec![Token::Address(owner)])?;
    single_uint(call.read(client, Some(owner)).await?, "balanceOf")
}

fn single_uint(tokens: Vec<Token>, function: &str) -> SeederResult<U256> {
    match tokens.as_slice() {
        [Token::Uint(value)] => Ok(*value),
        other => Err(SeederError::Abi(format!(
            "{} returned unexpected output {:?}",
            function, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockNodeClient;
    use ethers::types::Bytes;

    #[test]
    fn test_approve_encodes_spender_and_amount() {
        let call = approve(
            Address::repeat_byte(0xaa),
            Address::repeat_byte(0xbb),
            U256::from(200_000_000u64),
        )
        .unwrap();

        assert_eq!(call.signature(), "approve(address,uint256)");
        assert_eq!(
            call.args(),
            &[
                Token::Address(Address::repeat_byte(0xbb)),
                Token::Uint(U256::from(200_000_000u64))
            ]
        );
    }

    #[tokio::test]
    async fn test_allowance_reads_uint() {
        let token = Address::repeat_byte(0xaa);
        let mut client = MockNodeClient::new();
        client
            .expect_call()
            .withf(move |tx, block| {
                tx.to().and_then(|to| to.as_address().copied()) == Some(token)
                    && block.is_none()
                    && tx.data().map(|d| d[..4] == [0xdd, 0x62, 0xed, 0x3e]).unwrap_or(false)
            })
            .times(1)
            .returning(|_, _| Ok(Bytes::from(ethers::abi::encode(&[Token::Uint(U256::from(5))]))));

        let value = allowance(
            &client,
            token,
            Address::repeat_byte(0x01),
            Address::repeat_byte(0x02),
        )
        .await
        .unwrap();
        assert_eq!(value, U256::from(5));
    }

    #[tokio::test]
    async fn test_balance_of_rejects_empty_output() {
        let mut client = MockNodeClient::new();
        client.expect_call().returning(|_, _| Ok(Bytes::new()));

        let err = balance_of(&client, Address::repeat_byte(0xaa), Address::repeat_byte(0x01))
            .await
            .unwrap_err();
        assert!(matches!(err, SeederError::Abi(_)));
    }
}
