//! Approve both pool tokens, then add liquidity

use super::WorkflowContext;
use crate::config::Settings;
use crate::contracts::{display_amount, erc20, parse_amount, router, LiquidityParams};
use crate::error::{SeederError, SeederResult};
use crate::tx::{ConfirmedCall, GasBuffer};

use ethers::types::{Address, U256};
use tracing::{debug, error, info, warn};

/// One `approve` call in a seed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalStep {
    pub name: String,
    pub token: Address,
    pub spender: Address,
    pub amount: U256,
    pub decimals: u32,
    pub gas_buffer: Option<GasBuffer>,
}

impl ApprovalStep {
    /// Approval of `name` for the configured router.
    ///
    /// The amount is, in order: the explicit override, the token's
    /// `approve_amount`, or the pool's desired amount for that token.
    pub fn from_settings(
        settings: &Settings,
        name: &str,
        amount: Option<&str>,
    ) -> SeederResult<Self> {
        let pool = settings.pool()?;
        let token = settings.token(name)?;

        let desired = if *name == pool.token_a {
            Some(pool.amount_a_desired.as_str())
        } else if *name == pool.token_b {
            Some(pool.amount_b_desired.as_str())
        } else {
            None
        };

        let amount = amount
            .or(token.approve_amount.as_deref())
            .or(desired)
            .ok_or_else(|| {
                SeederError::Configuration(format!("No approval amount for {}", name))
            })?;

        Ok(Self {
            name: name.to_string(),
            token: settings.token_address(name)?,
            spender: pool.router,
            amount: parse_amount(amount, token.decimals)?,
            decimals: token.decimals,
            gas_buffer: token.gas_buffer,
        })
    }
}

/// Everything a seed run submits, resolved to raw values up front
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPlan {
    pub approvals: Vec<ApprovalStep>,
    pub router: Address,
    pub liquidity: LiquidityParams,
    pub deadline_window_secs: u64,
    pub gas_buffer: Option<GasBuffer>,
}

impl SeedPlan {
    pub fn from_settings(settings: &Settings) -> SeederResult<Self> {
        let pool = settings.pool()?;
        let token_a = settings.token(&pool.token_a)?;
        let token_b = settings.token(&pool.token_b)?;

        let liquidity = LiquidityParams {
            token_a: settings.token_address(&pool.token_a)?,
            token_b: settings.token_address(&pool.token_b)?,
            amount_a_desired: parse_amount(&pool.amount_a_desired, token_a.decimals)?,
            amount_b_desired: parse_amount(&pool.amount_b_desired, token_b.decimals)?,
            amount_a_min: parse_amount(&pool.amount_a_min, token_a.decimals)?,
            amount_b_min: parse_amount(&pool.amount_b_min, token_b.decimals)?,
        };

        if liquidity.amount_a_min > liquidity.amount_a_desired
            || liquidity.amount_b_min > liquidity.amount_b_desired
        {
            return Err(SeederError::Configuration(
                "Pool minimum amounts exceed desired amounts".to_string(),
            ));
        }

        let approvals = vec![
            ApprovalStep::from_settings(settings, &pool.token_a, None)?,
            ApprovalStep::from_settings(settings, &pool.token_b, None)?,
        ];

        for step in &approvals {
            let desired = if step.token == liquidity.token_a {
                liquidity.amount_a_desired
            } else {
                liquidity.amount_b_desired
            };
            if step.amount < desired {
                warn!(
                    "Approving {} {} but the pool wants {}; the router may revert",
                    display_amount(step.amount, step.decimals),
                    step.name,
                    display_amount(desired, step.decimals)
                );
            }
        }

        Ok(Self {
            approvals,
            router: pool.router,
            liquidity,
            deadline_window_secs: pool.deadline_window_secs,
            gas_buffer: pool.gas_buffer,
        })
    }
}

/// Confirmed calls of a completed seed run
#[derive(Debug, Clone)]
pub struct SeedOutcome {
    pub approvals: Vec<ConfirmedCall>,
    pub liquidity: ConfirmedCall,
}

/// Approve `step.spender` to pull `step.amount` of the token.
///
/// The current allowance is only logged: approve overwrites, so re-running it
/// with a sufficient allowance still submits and succeeds.
pub async fn approve_token(
    ctx: WorkflowContext<'_>,
    step: &ApprovalStep,
) -> SeederResult<ConfirmedCall> {
    let owner = ctx.account.address();

    match erc20::allowance(ctx.client, step.token, owner, step.spender).await {
        Ok(current) if current >= step.amount => info!(
            "{} allowance for {:?} already {}; approving again",
            step.name,
            step.spender,
            display_amount(current, step.decimals)
        ),
        Ok(current) => debug!(
            "{} allowance for {:?} is {}",
            step.name,
            step.spender,
            display_amount(current, step.decimals)
        ),
        Err(e) => warn!("Could not read {} allowance: {}", step.name, e),
    }

    let call = erc20::approve(step.token, step.spender, step.amount)?;
    let confirmed = ctx
        .pipeline
        .execute(ctx.client, ctx.account, call, step.gas_buffer)
        .await?;

    info!(
        "Approved {} {} for {:?} in {:?}",
        display_amount(step.amount, step.decimals),
        step.name,
        step.spender,
        confirmed.tx_hash()
    );
    Ok(confirmed)
}

/// Deposit liquidity, minting LP tokens to the acting account
pub async fn add_liquidity(ctx: WorkflowContext<'_>, plan: &SeedPlan) -> SeederResult<ConfirmedCall> {
    let deadline = router::deadline_from_now(plan.deadline_window_secs);
    let call = router::add_liquidity(plan.router, &plan.liquidity, ctx.account.address(), deadline)?;

    let confirmed = ctx
        .pipeline
        .execute(ctx.client, ctx.account, call, plan.gas_buffer)
        .await?;

    info!(
        "Liquidity added via {:?} in {:?} (block {}, deadline {})",
        plan.router,
        confirmed.tx_hash(),
        confirmed.block_number(),
        deadline
    );
    Ok(confirmed)
}

/// Run every approval, then the liquidity deposit.
///
/// A failed approval aborts the run; `addLiquidity` is only submitted once
/// every approval is confirmed.
pub async fn seed_pool(ctx: WorkflowContext<'_>, plan: &SeedPlan) -> SeederResult<SeedOutcome> {
    let mut approvals = Vec::with_capacity(plan.approvals.len());

    for step in &plan.approvals {
        match approve_token(ctx, step).await {
            Ok(confirmed) => approvals.push(confirmed),
            Err(e) => {
                error!("Approval of {} failed, not adding liquidity: {}", step.name, e);
                return Err(e);
            }
        }
    }

    let liquidity = add_liquidity(ctx, plan).await?;

    Ok(SeedOutcome {
        approvals,
        liquidity,
    })
}
