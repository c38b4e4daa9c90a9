//! The per-call submission sequence: estimate, pad, submit, wait

use super::call::CallSpec;
use super::confirm::{ConfirmationWaiter, ConfirmedCall};
use super::gas::{GasBuffer, GasEstimator};
use super::sender::TransactionSender;
use crate::account::AccountContext;
use crate::chain::NodeClient;
use crate::config::Settings;
use crate::error::SeederResult;

use std::fmt;
use tracing::{debug, info, warn};

/// Lifecycle of a single call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Built,
    Estimated,
    Submitted,
    Pending,
    Confirmed,
    Reverted,
    NetworkRejected,
}

impl CallState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CallState::Confirmed | CallState::Reverted | CallState::NetworkRejected
        )
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallState::Built => "built",
            CallState::Estimated => "estimated",
            CallState::Submitted => "submitted",
            CallState::Pending => "pending",
            CallState::Confirmed => "confirmed",
            CallState::Reverted => "reverted",
            CallState::NetworkRejected => "network-rejected",
        };
        f.write_str(name)
    }
}

/// Runs one call through every stage; no retries from a terminal failure
pub struct TransactionPipeline {
    estimator: GasEstimator,
    sender: TransactionSender,
    waiter: ConfirmationWaiter,
    default_buffer: GasBuffer,
}

impl TransactionPipeline {
    pub fn new(estimator: GasEstimator, waiter: ConfirmationWaiter, default_buffer: GasBuffer) -> Self {
        Self {
            estimator,
            sender: TransactionSender::new(),
            waiter,
            default_buffer,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            GasEstimator::from_config(&settings.network),
            ConfirmationWaiter::from_config(&settings.submission),
            settings.submission.default_gas_buffer,
        )
    }

    pub fn estimator(&self) -> &GasEstimator {
        &self.estimator
    }

    /// Execute a call, returning once it is confirmed.
    ///
    /// `buffer` overrides the default padding for call shapes with higher
    /// estimation variance.
    pub async fn execute(
        &self,
        client: &dyn NodeClient,
        account: &AccountContext,
        call: CallSpec,
        buffer: Option<GasBuffer>,
    ) -> SeederResult<ConfirmedCall> {
        let buffer = buffer.unwrap_or(self.default_buffer);
        transition(&call, CallState::Built);

        let quote = self.estimator.estimate(client, account, &call).await?;
        let gas_limit = quote.gas_limit(buffer);
        debug_assert!(gas_limit >= quote.estimated_gas);
        transition(&call, CallState::Estimated);
        debug!(
            "{}: estimate {} padded {} to {}",
            call, quote.estimated_gas, buffer, gas_limit
        );

        let submitted = self
            .sender
            .submit(client, account, &call, gas_limit, quote.fee)
            .await
            .map_err(|e| {
                if let Some(state) = e.terminal_state() {
                    transition(&call, state);
                }
                e
            })?;
        transition(&call, CallState::Submitted);

        info!(
            "{} pending as {:?}, max cost {} wei",
            call,
            submitted.hash,
            GasEstimator::calculate_cost(gas_limit, &submitted.fee)
        );
        transition(&call, CallState::Pending);

        match self.waiter.wait(client, &submitted).await {
            Ok(confirmed) => {
                transition(&call, CallState::Confirmed);
                Ok(confirmed)
            }
            Err(e) => {
                match e.terminal_state() {
                    Some(state) => transition(&call, state),
                    None => warn!("{} left unresolved: {}", call, e),
                }
                Err(e)
            }
        }
    }
}

fn transition(call: &CallSpec, state: CallState) {
    if state.is_terminal() && state != CallState::Confirmed {
        warn!(state = %state, "{}", call);
    } else {
        info!(state = %state, "{}", call);
    }
}
