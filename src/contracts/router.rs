//! Uniswap-V2-style router: addLiquidity

use crate::error::SeederResult;
use crate::tx::CallSpec;

use ethers::abi::Token;
use ethers::types::{Address, U256};

pub const ADD_LIQUIDITY: &str = "function addLiquidity(address tokenA, address tokenB, uint256 amountADesired, uint256 amountBDesired, uint256 amountAMin, uint256 amountBMin, address to, uint256 deadline) external returns (uint256 amountA, uint256 amountB, uint256 liquidity)";

/// Raw (already scaled) amounts for one liquidity deposit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiquidityParams {
    pub token_a: Address,
    pub token_b: Address,
    pub amount_a_desired: U256,
    pub amount_b_desired: U256,
    pub amount_a_min: U256,
    pub amount_b_min: U256,
}

/// Unix deadline `window_secs` after `now_secs`
pub fn deadline_at(now_secs: u64, window_secs: u64) -> U256 {
    U256::from(now_secs) + U256::from(window_secs)
}

/// Deadline relative to the local clock
pub fn deadline_from_now(window_secs: u64) -> U256 {
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    deadline_at(now, window_secs)
}

/// `addLiquidity` with LP tokens minted to `to`
pub fn add_liquidity(
    router: Address,
    params: &LiquidityParams,
    to: Address,
    deadline: U256,
) -> SeederResult<CallSpec> {
    CallSpec::new(
        router,
        ADD_LIQUIDITY,
        vec![
            Token::Address(params.token_a),
            Token::Address(params.token_b),
            Token::Uint(params.amount_a_desired),
            Token::Uint(params.amount_b_desired),
            Token::Uint(params.amount_a_min),
            Token::Uint(params.amount_b_min),
            Token::Address(to),
            Token::Uint(deadline),
        ],
    )
}
