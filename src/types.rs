//! Core types for the dona-metrics computation core
//!
//! This module defines the value types that flow through the estimators:
//! events, burstiness results, inequality results, and interaction balance
//! records. Everything here is freshly computed per analysis request; nothing
//! is shared or mutated.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// One message instance, already attributed to a donor's donation.
///
/// Events are immutable once loaded; the estimators only derive aggregates
/// from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Opaque identifier grouping events into a conversation ("chat")
    pub conversation_id: String,
    /// Party who authored the event (the donor's own id or a contact's)
    pub sender_id: String,
    /// Message timestamp (UTC, at least day+hour resolution)
    pub timestamp: DateTime<Utc>,
    /// Non-negative word count of the message body
    pub word_count: u64,
}

impl Event {
    /// Calendar day of the event
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Hour of day, 0-23
    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    /// True if the event was authored by `donor_id`
    pub fn sent_by(&self, donor_id: &str) -> bool {
        self.sender_id == donor_id
    }
}

/// Which quantity a count-based estimator aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountMetric {
    /// Number of messages
    Messages,
    /// Sum of message word counts
    Words,
}

impl CountMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountMetric::Messages => "messages",
            CountMetric::Words => "words",
        }
    }
}

/// Burstiness indices for one day-set.
///
/// Both components are `None` when the input has fewer than 2 distinct event
/// days, when the mean inter-event interval is zero, or when an index's
/// denominator is exactly zero. `None` is never coerced to a numeric default:
/// 0 is itself a legitimate burstiness value with a different meaning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurstinessResult {
    /// Classic burstiness index, (r - 1) / (r + 1), roughly in (-1, 1)
    pub b1: Option<f64>,
    /// Second-order index correcting small-sample bias in B1
    pub b2: Option<f64>,
}

impl BurstinessResult {
    /// The undefined marker: both components absent
    pub const UNDEFINED: BurstinessResult = BurstinessResult { b1: None, b2: None };

    /// True if B1 is defined (and therefore classifiable)
    pub fn is_defined(&self) -> bool {
        self.b1.is_some()
    }
}

/// Categorical label for a B1 value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BurstinessClass {
    /// B1 below the lower threshold: evenly spread contact
    Regular,
    /// B1 within the thresholds: memoryless timing
    Random,
    /// B1 above the upper threshold: clustered contact
    Bursty,
    /// B1 undefined (insufficient data)
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl BurstinessClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            BurstinessClass::Regular => "Regular",
            BurstinessClass::Random => "Random",
            BurstinessClass::Bursty => "Bursty",
            BurstinessClass::NotAvailable => "N/A",
        }
    }
}

/// Classification thresholds for B1.
///
/// Boundary rule: values exactly equal to either threshold classify as
/// `Random` (the comparisons are strict).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurstinessThresholds {
    /// B1 strictly below this is `Regular`
    pub regular_below: f64,
    /// B1 strictly above this is `Bursty`
    pub bursty_above: f64,
}

impl Default for BurstinessThresholds {
    fn default() -> Self {
        Self {
            regular_below: -0.2,
            bursty_above: 0.2,
        }
    }
}

/// Burstiness of a single conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBurstiness {
    pub conversation_id: String,
    /// Distinct event days, ascending
    pub event_days: Vec<NaiveDate>,
    pub result: BurstinessResult,
    pub class: BurstinessClass,
}

/// One point of a Lorenz curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LorenzPoint {
    /// Cumulative fraction of contacts, 0-1
    pub population_frac: f64,
    /// Cumulative fraction of the counted value, 0-1
    pub value_frac: f64,
}

/// Sent/received word totals and bias for one conversation.
///
/// `bias = 0.5 - donor_words / total_words`; `None` when the conversation has
/// no words at all. Records with undefined bias must be excluded before any
/// mean/median aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionBalanceRecord {
    pub conversation_id: String,
    /// Words authored by the donor in this conversation
    pub donor_words: u64,
    /// Words authored by anyone else in this conversation
    pub contact_words: u64,
    pub bias: Option<f64>,
}

impl InteractionBalanceRecord {
    pub fn is_defined(&self) -> bool {
        self.bias.is_some()
    }
}

/// Donor-level interaction style derived from the mean bias
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceStyle {
    /// |mean bias| strictly below the threshold
    Balanced,
    /// Mean bias negative: the donor contributes more words
    DonorDominant,
    /// Mean bias positive (or at the threshold boundary): contacts contribute more
    ContactDominant,
}

impl BalanceStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceStyle::Balanced => "Balanced",
            BalanceStyle::DonorDominant => "Donor Dominant",
            BalanceStyle::ContactDominant => "Contact Dominant",
        }
    }
}

/// Donor-level rollup of defined biases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSummary {
    /// Arithmetic mean of defined biases
    pub mean_bias: f64,
    /// Median of defined biases
    pub median_bias: f64,
    /// Number of conversations with a defined bias
    pub defined_chats: usize,
    pub style: BalanceStyle,
}
