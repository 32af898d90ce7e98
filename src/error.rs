use thiserror::Error;

pub type Result<T, E = ContributionError> = std::result::Result<T, E>;

/// Errors surfaced by the allocation, execution, void and reconciliation
/// services.
///
/// Validation variants carry user-facing text and are recoverable (the caller
/// can retry with different input). Invariant violations are never represented
/// here; those panic.
#[derive(Error, Debug)]
pub enum ContributionError {
    #[error("all of the recipients have been removed")]
    NoRecipients,
    #[error("the amount is less than the minimum fee")]
    BelowMinimumFee,
    #[error("the amount is too small to divide among the recipients")]
    AmountTooSmall,
    #[error("the amount is greater than the maximum contribution")]
    ExceedsMaximum,
    #[error("campaign {0} not found")]
    CampaignNotFound(u64),
    #[error("contribution {0} not found")]
    ContributionNotFound(u64),
    #[error("contribution has no processor transaction")]
    NoTransaction,
    #[error("contribution has already been voided")]
    AlreadyVoided,
    #[error("processor error: {0}")]
    Processor(#[from] ProcessorError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors returned by the external payment processor client.
///
/// `Validation` carries the processor's human-readable rejection text, which
/// the void state machine pattern-matches for the "not yet captured" case.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessorError {
    #[error("processor rejected the request: {0}")]
    Validation(String),
    #[error("processor unavailable: {0}")]
    Network(String),
    #[error("unexpected processor response: {0}")]
    Unexpected(String),
}

impl ProcessorError {
    /// True when a void was rejected because the authorization has not been
    /// captured yet. Such a transaction cannot be credited either, so the
    /// caller must not fall through to a credit attempt.
    pub fn is_uncaptured_rejection(&self) -> bool {
        match self {
            ProcessorError::Validation(text) => {
                let text = text.to_ascii_lowercase();
                text.contains("not been captured") || text.contains("not yet captured")
            }
            _ => false,
        }
    }
}
