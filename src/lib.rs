//! Dona Metrics - statistical computation core for donated message-log analysis
//!
//! Transforms a donor's filtered message log into quantitative communication
//! indicators through deterministic, pure estimators:
//!
//! - **Temporal binning**: dense day×hour and day×conversation activity grids
//! - **Burstiness**: inter-event-interval indices (B1, B2) with
//!   Regular/Random/Bursty classification and donor-level views
//! - **Inequality**: Gini coefficient and Lorenz curve over per-contact counts
//! - **Interaction balance**: sent/received word bias per conversation
//!
//! The estimators never mutate their inputs and hold no shared state; each
//! analysis request computes fresh value types from an immutable [`Dataset`]
//! view supplied by the ingestion layer.

pub mod balance;
pub mod burstiness;
pub mod dataset;
pub mod error;
pub mod gini;
pub mod grid;
pub mod report;
pub mod series;
pub mod types;

pub use balance::{compute_interaction_balance, summarize_balance};
pub use burstiness::{
    aggregate_burstiness, burstiness_by_conversation, classify_b1, compute_burstiness,
    dominant_behavior, most_extreme_chat,
};
pub use dataset::Dataset;
pub use error::AnalysisError;
pub use gini::{calculate_gini, conversation_counts, lorenz_curve};
pub use grid::{day_conversation_grid, day_hour_grid, sent_received_grid, threshold_grid};
pub use report::{DonorReport, ReportEncoder};
pub use series::{daily_series, moving_average};
pub use types::{
    BalanceStyle, BalanceSummary, BurstinessClass, BurstinessResult, BurstinessThresholds,
    ChatBurstiness, CountMetric, Event, InteractionBalanceRecord, LorenzPoint,
};

/// Crate version embedded in report payloads
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "dona-metrics";
