//! Monitor errors

use thiserror::Error;

/// Contract violations by the caller of the classifier.
///
/// Data-quality problems inside a batch are never reported here; they are
/// isolated to the offending record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Unknown subscription status text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown subscription status: {0}")]
pub struct ParseStatusError(pub String);

/// Errors surfaced by a [`SubscriptionRepository`](super::SubscriptionRepository)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("subscription not found: {0}")]
    NotFound(String),

    #[error("subscription already exists: {0}")]
    Conflict(String),

    #[error("invalid subscription: {0}")]
    Invalid(String),

    #[error("repository backend error: {0}")]
    Backend(String),
}
