//! Configuration management for the pool seeder
//!
//! Loads configuration from TOML files with environment variable substitution.

use crate::contracts::parse_amount;
use crate::error::{SeederError, SeederResult};
use crate::tx::GasBuffer;

use anyhow::{Context, Result};
use ethers::types::{Address, U256};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "POOL_SEEDER_CONFIG";

lazy_static! {
    static ref ENV_VAR_PATTERN: Regex = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub network: NetworkConfig,
    pub wallet: WalletConfig,
    #[serde(default)]
    pub submission: SubmissionConfig,
    #[serde(default)]
    pub tokens: BTreeMap<String, TokenConfig>,
    pub pool: Option<PoolConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub fee_model: FeeModel,
    #[serde(default = "default_max_gas_price_gwei")]
    pub max_gas_price_gwei: u64,
    #[serde(default = "default_priority_fee_gwei")]
    pub default_priority_fee_gwei: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeeModel {
    Legacy,
    #[default]
    Eip1559,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Name of the environment variable holding the hex private key
    pub private_key_env: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionConfig {
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_gas_buffer")]
    pub default_gas_buffer: GasBuffer,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            confirmations: default_confirmations(),
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            default_gas_buffer: default_gas_buffer(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// Deployed address; absent until the token has been deployed
    pub address: Option<Address>,
    pub decimals: u32,
    /// Raw constructor argument in base units, as a decimal string so it can
    /// exceed 64 bits
    pub initial_supply: Option<String>,
    /// Compiled Hardhat artifact used for deployment
    pub artifact: Option<PathBuf>,
    /// Human-readable amount to approve for the router
    pub approve_amount: Option<String>,
    pub gas_buffer: Option<GasBuffer>,
}

impl TokenConfig {
    /// Constructor supply as a `uint256`
    pub fn constructor_supply(&self) -> SeederResult<Option<U256>> {
        self.initial_supply
            .as_deref()
            .map(|supply| parse_amount(supply, 0))
            .transpose()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    pub router: Address,
    pub token_a: String,
    pub token_b: String,
    pub amount_a_desired: String,
    pub amount_b_desired: String,
    pub amount_a_min: String,
    pub amount_b_min: String,
    #[serde(default = "default_deadline_window_secs")]
    pub deadline_window_secs: u64,
    pub gas_buffer: Option<GasBuffer>,
}

fn default_max_gas_price_gwei() -> u64 {
    500
}

fn default_priority_fee_gwei() -> u64 {
    2
}

fn default_confirmations() -> u64 {
    1
}

fn default_confirmation_timeout_secs() -> u64 {
    300
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_gas_buffer() -> GasBuffer {
    GasBuffer::Percent(10)
}

fn default_deadline_window_secs() -> u64 {
    20 * 60
}

impl Settings {
    /// Load settings from `POOL_SEEDER_CONFIG` or `config/default.toml`
    pub fn load() -> Result<Self> {
        let config_path = env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        Self::load_from(&config_path)
    }

    /// Load settings from an explicit path
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::parse(&config_str)
    }

    /// Parse settings from TOML text
    pub fn parse(config_str: &str) -> Result<Self> {
        // Substitute environment variables
        let config_str = substitute_env_vars(config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> SeederResult<()> {
        if self.network.rpc_urls.iter().all(|url| url.trim().is_empty()) {
            return Err(SeederError::Configuration(format!(
                "Network {} has no RPC URLs configured",
                self.network.name
            )));
        }

        if self.wallet.private_key_env.is_empty() {
            return Err(SeederError::Configuration(
                "wallet.private_key_env must name an environment variable".to_string(),
            ));
        }

        if self.submission.poll_interval_ms == 0 {
            return Err(SeederError::Configuration(
                "submission.poll_interval_ms must be positive".to_string(),
            ));
        }

        if let Some(pool) = &self.pool {
            for name in [&pool.token_a, &pool.token_b] {
                if !self.tokens.contains_key(name) {
                    return Err(SeederError::Configuration(format!(
                        "Pool references unknown token {}",
                        name
                    )));
                }
            }
            if pool.token_a == pool.token_b {
                return Err(SeederError::Configuration(
                    "Pool tokens must differ".to_string(),
                ));
            }
        }

        for (name, token) in &self.tokens {
            token.constructor_supply().map_err(|e| {
                SeederError::Configuration(format!("tokens.{}.initial_supply: {}", name, e))
            })?;
            if token.address.is_none() && token.artifact.is_none() {
                tracing::warn!("Token {} has neither an address nor an artifact", name);
            }
        }

        Ok(())
    }

    /// Get token config by name
    pub fn token(&self, name: &str) -> SeederResult<&TokenConfig> {
        self.tokens
            .get(name)
            .ok_or_else(|| SeederError::UnknownToken(name.to_string()))
    }

    /// Deployed address of a token
    pub fn token_address(&self, name: &str) -> SeederResult<Address> {
        self.token(name)?.address.ok_or_else(|| {
            SeederError::Configuration(format!("Token {} has no deployed address", name))
        })
    }

    /// Pool section, required by the liquidity commands
    pub fn pool(&self) -> SeederResult<&PoolConfig> {
        self.pool
            .as_ref()
            .ok_or_else(|| SeederError::Configuration("No [pool] section configured".to_string()))
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(input, |caps: &regex::Captures| {
            env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}
