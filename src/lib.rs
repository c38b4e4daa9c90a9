//! Pool seeder - gas-aware transaction submission for ERC-20 approvals,
//! liquidity deposits and token deployment on EVM chains.

pub mod account;
pub mod chain;
pub mod config;
pub mod contracts;
pub mod error;
pub mod tx;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use account::AccountContext;
pub use config::Settings;
pub use error::{SeederError, SeederResult};
