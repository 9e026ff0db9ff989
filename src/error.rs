//! Error types for dona-metrics

use thiserror::Error;

/// Errors that can occur during analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The caller supplied zero events where at least one is structurally
    /// required (e.g. grid construction needs a day range). Recoverable
    /// "no data" condition, not a crash.
    #[error("No events to analyze: {0}")]
    EmptyInput(String),

    /// The requested donor id does not appear in the dataset
    #[error("Unknown donor id: {0}")]
    UnknownDonor(String),

    /// The requested conversation id does not appear in the selected events
    #[error("Unknown conversation id: {0}")]
    UnknownConversation(String),

    /// A message timestamp could not be parsed
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Two grids being combined do not share the same row/column domains
    #[error("Grid domain mismatch: {0}")]
    GridDomainMismatch(String),

    #[error("Failed to parse dataset: {0}")]
    ParseError(String),
}
