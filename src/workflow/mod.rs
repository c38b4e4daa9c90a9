//! Workflows built on the transaction pipeline
//!
//! Each workflow runs its calls strictly one after another from a single
//! account:
//! 1. Token deployment from compiled artifacts
//! 2. Sequential approvals followed by the liquidity deposit
//! 3. Read-only fee and allowance reports

pub mod deploy;
pub mod fees;
pub mod seed;

pub use deploy::{deploy_token, DeployedToken};
pub use fees::{fee_report, FeeReport};
pub use seed::{add_liquidity, approve_token, seed_pool, ApprovalStep, SeedOutcome, SeedPlan};

use crate::account::AccountContext;
use crate::chain::NodeClient;
use crate::tx::TransactionPipeline;

/// Everything a workflow step needs, passed explicitly
#[derive(Clone, Copy)]
pub struct WorkflowContext<'a> {
    pub client: &'a dyn NodeClient,
    pub account: &'a AccountContext,
    pub pipeline: &'a TransactionPipeline,
}

impl<'a> WorkflowContext<'a> {
    pub fn new(
        client: &'a dyn NodeClient,
        account: &'a AccountContext,
        pipeline: &'a TransactionPipeline,
    ) -> Self {
        Self {
            client,
            account,
            pipeline,
        }
    }
}
