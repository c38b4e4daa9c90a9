//! Contract bindings used by the seeder
//!
//! Calls are built from human-readable ABI fragments rather than generated
//! bindings, so each module only carries the functions it actually submits or
//! reads.

pub mod artifact;
pub mod erc20;
pub mod router;

pub use artifact::ContractArtifact;
pub use router::LiquidityParams;

use crate::error::{SeederError, SeederResult};

use ethers::types::U256;
use ethers::utils::{format_units, parse_units, ParseUnits};

/// Scale a decimal amount such as `"200"` or `"0.5"` by `decimals`
pub fn parse_amount(amount: &str, decimals: u32) -> SeederResult<U256> {
    let amount = amount.trim();
    match parse_units(amount, decimals) {
        Ok(ParseUnits::U256(value)) => Ok(value),
        Ok(ParseUnits::I256(_)) => Err(SeederError::Configuration(format!(
            "Amount {} must not be negative",
            amount
        ))),
        Err(e) => Err(SeederError::Configuration(format!(
            "Invalid amount {}: {}",
            amount, e
        ))),
    }
}

/// Render a raw token amount with its decimals, for logs
pub fn display_amount(raw: U256, decimals: u32) -> String {
    format_units(raw, decimals).unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_scales_by_decimals() {
        assert_eq!(parse_amount("200", 8).unwrap(), U256::from(20_000_000_000u64));
        assert_eq!(parse_amount("200", 6).unwrap(), U256::from(200_000_000u64));
        assert_eq!(parse_amount("0.5", 6).unwrap(), U256::from(500_000u64));
        assert_eq!(parse_amount(" 1 ", 0).unwrap(), U256::one());
    }

    #[test]
    fn test_parse_amount_rejects_bad_input() {
        assert!(matches!(
            parse_amount("-1", 6),
            Err(SeederError::Configuration(_))
        ));
        assert!(matches!(
            parse_amount("lots", 6),
            Err(SeederError::Configuration(_))
        ));
    }

    #[test]
    fn test_display_amount() {
        assert_eq!(display_amount(U256::from(20_000_000_000u64), 8), "200.00000000");
    }
}
