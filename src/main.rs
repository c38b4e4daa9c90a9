//! Pool Seeder - deploys ERC-20 tokens and seeds a Uniswap-V2-style pool
//!
//! Every command runs its transactions one at a time from a single account,
//! waiting for each to confirm before the next is built.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pool_seeder::chain::{ChainProvider, NodeClient};
use pool_seeder::contracts::{display_amount, erc20};
use pool_seeder::tx::TransactionPipeline;
use pool_seeder::workflow::{self, ApprovalStep, SeedPlan, WorkflowContext};
use pool_seeder::{AccountContext, SeederError, Settings};
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration
    #[arg(long, short = 'c', global = true, env = "POOL_SEEDER_CONFIG")]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// Deploy configured tokens from their compiled artifacts
    Deploy {
        /// Only deploy this token
        #[arg(long)]
        token: Option<String>,
    },
    /// Approve the router to spend a token
    Approve {
        #[arg(long)]
        token: String,
        /// Decimal amount; defaults to the configured approval amount
        #[arg(long)]
        amount: Option<String>,
    },
    /// Add liquidity with the configured pool amounts
    #[clap(name = "add-liquidity")]
    AddLiquidity,
    /// Approve both pool tokens, then add liquidity
    Seed,
    /// Report current network fees
    Fees,
    /// Show the router allowance and balance for a token
    Allowance {
        #[arg(long)]
        token: String,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Deploy { .. } => "deploy",
            Command::Approve { .. } => "approve",
            Command::AddLiquidity => "add-liquidity",
            Command::Seed => "seed",
            Command::Fees => "fees",
            Command::Allowance { .. } => "allowance",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let run_id = Uuid::new_v4();
    let span = info_span!("run", %run_id, command = cli.command.name());

    info!(parent: &span, "Starting Pool Seeder v{}", env!("CARGO_PKG_VERSION"));

    tokio::select! {
        result = run(cli).instrument(span.clone()) => {
            if let Err(e) = &result {
                error!(parent: &span, "{:#}", e);
                if may_be_in_flight(e) {
                    warn!(parent: &span, "The last submitted transaction may still be mined");
                }
            }
            result
        }
        _ = shutdown_signal() => {
            let err = SeederError::Cancelled;
            if err.may_be_in_flight() {
                warn!(parent: &span, "Interrupted; a submitted transaction may still be mined");
            }
            Err(err.into())
        }
    }
}

/// Whether any `SeederError` in the context chain leaves a transaction unresolved
fn may_be_in_flight(err: &anyhow::Error) -> bool {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<SeederError>())
        .map_or(false, SeederError::may_be_in_flight)
}

async fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("Failed to load configuration")?;

    info!(
        "Using network {} (chain ID {})",
        settings.network.name, settings.network.chain_id
    );

    let provider = ChainProvider::connect(settings.network.clone())
        .await
        .context("Failed to connect to the network")?;
    let pipeline = TransactionPipeline::from_settings(&settings);

    match cli.command {
        Command::Fees => {
            workflow::fee_report(&provider, pipeline.estimator()).await?;
        }
        Command::Deploy { token } => {
            let account = load_account(&settings)?;
            let ctx = WorkflowContext::new(&provider, &account, &pipeline);
            let names: Vec<&String> = match &token {
                Some(name) => vec![name],
                None => settings
                    .tokens
                    .iter()
                    .filter(|(_, token)| token.artifact.is_some())
                    .map(|(name, _)| name)
                    .collect(),
            };
            if names.is_empty() {
                warn!("No tokens with an artifact configured");
            }

            for name in names {
                let config = settings.token(name)?;
                let deployed = workflow::deploy_token(ctx, name, config)
                    .await
                    .with_context(|| format!("Deploying {} failed", name))?;
                info!(
                    "Set tokens.{}.address = \"{:?}\" to use it in the pool",
                    deployed.name, deployed.address
                );
            }
        }
        Command::Approve { token, amount } => {
            let account = load_account(&settings)?;
            let ctx = WorkflowContext::new(&provider, &account, &pipeline);
            let step = ApprovalStep::from_settings(&settings, &token, amount.as_deref())?;
            workflow::approve_token(ctx, &step)
                .await
                .with_context(|| format!("Approving {} failed", token))?;
        }
        Command::AddLiquidity => {
            let account = load_account(&settings)?;
            let ctx = WorkflowContext::new(&provider, &account, &pipeline);
            let plan = SeedPlan::from_settings(&settings)?;
            workflow::add_liquidity(ctx, &plan)
                .await
                .context("Adding liquidity failed")?;
        }
        Command::Seed => {
            let account = load_account(&settings)?;
            let ctx = WorkflowContext::new(&provider, &account, &pipeline);
            let plan = SeedPlan::from_settings(&settings)?;
            let outcome = workflow::seed_pool(ctx, &plan)
                .await
                .context("Seeding the pool failed")?;
            info!(
                "Pool seeded: {} approvals, liquidity in {:?}",
                outcome.approvals.len(),
                outcome.liquidity.tx_hash()
            );
        }
        Command::Allowance { token } => {
            let step = ApprovalStep::from_settings(&settings, &token, None)?;
            let owner = load_account(&settings)?.address();
            let allowance = erc20::allowance(&provider, step.token, owner, step.spender).await?;
            let balance = erc20::balance_of(&provider, step.token, owner).await?;
            let native = provider.balance(owner).await?;
            info!(
                "{}: allowance {} for {:?}, balance {} (native balance {} wei)",
                token,
                display_amount(allowance, step.decimals),
                step.spender,
                display_amount(balance, step.decimals),
                native
            );
        }
    }

    Ok(())
}

fn load_account(settings: &Settings) -> Result<AccountContext> {
    let account =
        AccountContext::from_env(&settings.wallet.private_key_env, settings.network.chain_id)
            .context("Failed to load the signing account")?;
    info!("Acting as {:?}", account.address());
    Ok(account)
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pool_seeder=debug,hyper=warn,reqwest=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
