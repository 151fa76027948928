use thiserror::Error;

use crate::domain::ValidationError;

/// Every failure a consumer of the ledger can observe.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The store could not be opened or its schema created. Fatal for the
    /// screen that asked for it.
    #[error("Could not open the ledger: {0:#}")]
    StorageInit(#[source] anyhow::Error),

    /// Input was rejected before touching storage.
    #[error("Invalid entry: {0}")]
    Validation(#[from] ValidationError),

    /// An insert failed after validation. Nothing was stored; safe to resubmit.
    #[error("Could not save the entry: {0:#}")]
    Write(#[source] anyhow::Error),

    /// A list or sum query failed. Previously loaded data is still valid.
    #[error("Could not load the ledger: {0:#}")]
    Read(#[source] anyhow::Error),
}

impl LedgerError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Write(_) | LedgerError::Read(_))
    }
}
