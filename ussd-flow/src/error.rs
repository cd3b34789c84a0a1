use thiserror::Error;

use crate::domain::PolicyId;

/// Failures that escape a flow handler.
///
/// Bad subscriber input and missing preconditions never show up here; flows
/// answer those with a terminal reply. Anything that does end up as a
/// `FlowError` is turned into the generic apology by [`crate::UssdRunner`].
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Session storage error: {0}")]
    SessionStorage(String),

    #[error("Policy not found: {0}")]
    PolicyNotFound(PolicyId),

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    #[error("Ledger error: {0}")]
    Ledger(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
