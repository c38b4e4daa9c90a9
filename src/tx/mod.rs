//! Transaction submission: call building, gas estimation, signing and
//! confirmation

mod call;
mod confirm;
mod gas;
mod pipeline;
mod sender;

pub use call::{CallSpec, CallTarget};
pub use confirm::{ConfirmationWaiter, ConfirmedCall};
pub use gas::{FeeQuote, GasBuffer, GasEstimator, GasPrice};
pub use pipeline::{CallState, TransactionPipeline};
pub use sender::{SubmittedTransaction, TransactionSender};
