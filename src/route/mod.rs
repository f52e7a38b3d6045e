//! Transfer orchestration.
//!
//! [`RouteController`] runs the validate, quote and initiate steps of a
//! transfer and hands tracking to the [`AttestationTracker`].

mod controller;
mod tracker;
mod types;

pub use controller::RouteController;
pub use tracker::AttestationTracker;
pub use types::{
    AttestationReceipt, NormalizedOptions, Quote, QuoteFailure, QuoteResult, QuoteWarning,
    TokenDetails, TransactionId, TransferInput, TransferOptions, TransferReceipt,
    TransferRequest, TransferState, ValidatedParams,
};
