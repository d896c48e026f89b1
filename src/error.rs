use thiserror::Error;

/// Everything that can go wrong between raw message bytes and a stored
/// transaction. `Remote` wraps external-call failures; every other variant
/// is structural and will not succeed on a later attempt.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unreadable body: {0}")]
    Unreadable(String),

    #[error("no text/plain or text/html content found")]
    ContentNotFound,

    #[error("field {0:?} not found in text")]
    FieldNotFound(&'static str),

    #[error("unparsable transaction date {0:?}")]
    DateFormat(String),

    #[error("unparsable amount {0:?}")]
    AmountFormat(String),

    #[error("no account in email and no default account configured")]
    NoAccount,

    #[error("unrecognized account {institution}-{label} and no default account configured")]
    UnrecognizedAccount { institution: String, label: String },

    #[error(transparent)]
    Remote(#[from] anyhow::Error),
}

impl IngestError {
    /// Remote failures leave the message unread so the next run retries it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IngestError::Remote(_))
    }
}
