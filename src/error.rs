// =============================================================================
// Error taxonomy
// =============================================================================
//
// Only the retrieval boundary fails with I/O errors. Empty results and
// insufficient indicator history are modelled as states, not errors
// (`Snapshot::NotFound`, `Classification::InsufficientData`).
// =============================================================================

use std::time::Duration;

use thiserror::Error;

use crate::types::SeriesKey;

/// Failure to obtain a price series from the market-data provider.
///
/// Callers present this as a transient "try again" state. It is never
/// converted into an empty series.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("market data request for {key} timed out after {timeout:?}")]
    Timeout { key: SeriesKey, timeout: Duration },

    #[error("market data provider '{provider}' failed for {key}: {message}")]
    Provider {
        key: SeriesKey,
        provider: &'static str,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// Unsupported period, unknown policy preset, or inconsistent thresholds.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

impl EngineError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retrieval(_))
    }

    /// Short message for an end user, without provider internals.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration(_) => "Invalid request. Check the symbol, period and policy.",
            Self::Retrieval(_) => "Market data is temporarily unavailable. Please try again.",
        }
    }
}
