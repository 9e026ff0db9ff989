//! Donor report encoding
//!
//! Composes the estimator outputs for one donor into a single versioned JSON
//! payload with producer and provenance metadata, ready for a presentation
//! layer to consume.

use crate::balance::{compute_interaction_balance, summarize_balance, DEFAULT_BALANCED_BELOW};
use crate::burstiness::{
    aggregate_burstiness, burstiness_by_conversation, classify_b1, dominant_behavior,
    most_extreme_chat, DominantBehavior,
};
use crate::dataset::sent_only;
use crate::error::AnalysisError;
use crate::gini::{calculate_gini, conversation_counts, lorenz_curve};
use crate::types::{
    BalanceSummary, BurstinessClass, BurstinessResult, BurstinessThresholds, ChatBurstiness,
    CountMetric, Event, InteractionBalanceRecord, LorenzPoint,
};
use crate::{PRODUCER_NAME, VERSION};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Producer metadata stamped on every report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Burstiness section: the three donor-level views plus per-chat detail.
///
/// Computed from the donor's sent messages only; received traffic says
/// nothing about the donor's own contact rhythm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurstinessSection {
    pub aggregate: BurstinessResult,
    pub aggregate_class: BurstinessClass,
    pub per_chat: Vec<ChatBurstiness>,
    pub dominant: Vec<DominantBehavior>,
    pub most_extreme: Option<ChatBurstiness>,
}

/// Inequality section for one count metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InequalitySection {
    pub metric: CountMetric,
    pub gini: f64,
    /// Absent when the donor sent nothing countable (not plottable)
    pub lorenz: Option<Vec<LorenzPoint>>,
}

/// Interaction balance section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSection {
    pub records: Vec<InteractionBalanceRecord>,
    /// Absent when no conversation has a defined bias
    pub summary: Option<BalanceSummary>,
}

/// Complete donor-level analysis payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub donor_id: String,
    pub computed_at_utc: String,
    pub event_count: usize,
    pub conversation_count: usize,
    pub burstiness: BurstinessSection,
    pub inequality: Vec<InequalitySection>,
    pub balance: BalanceSection,
}

/// Report encoder carrying the classification thresholds and a stable
/// instance id for provenance.
pub struct ReportEncoder {
    instance_id: String,
    thresholds: BurstinessThresholds,
    balanced_below: f64,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create an encoder with default thresholds and a fresh instance id
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
            thresholds: BurstinessThresholds::default(),
            balanced_below: DEFAULT_BALANCED_BELOW,
        }
    }

    /// Create an encoder with a specific instance id
    pub fn with_instance_id(instance_id: String) -> Self {
        Self {
            instance_id,
            ..Self::new()
        }
    }

    /// Override the B1 classification thresholds
    pub fn with_thresholds(mut self, thresholds: BurstinessThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Override the balanced-style threshold
    pub fn with_balanced_below(mut self, balanced_below: f64) -> Self {
        self.balanced_below = balanced_below;
        self
    }

    /// Build a full report for one donor from their already-filtered events.
    ///
    /// `events` must contain both sent and received messages; the encoder
    /// filters to sent-only where an estimator requires it.
    pub fn encode(&self, donor_id: &str, events: &[Event]) -> Result<DonorReport, AnalysisError> {
        if events.is_empty() {
            return Err(AnalysisError::EmptyInput(format!(
                "donor {donor_id} has no events to report on"
            )));
        }

        let sent = sent_only(events, donor_id);

        let per_chat = burstiness_by_conversation(&sent, &self.thresholds);
        let aggregate = aggregate_burstiness(&sent);
        let burstiness = BurstinessSection {
            aggregate,
            aggregate_class: classify_b1(aggregate.b1, &self.thresholds),
            dominant: dominant_behavior(&per_chat),
            most_extreme: most_extreme_chat(&per_chat).cloned(),
            per_chat,
        };

        let inequality = [CountMetric::Messages, CountMetric::Words]
            .into_iter()
            .map(|metric| {
                let counts = conversation_counts(events, donor_id, metric);
                InequalitySection {
                    metric,
                    gini: calculate_gini(&counts),
                    lorenz: lorenz_curve(&counts),
                }
            })
            .collect();

        let records = compute_interaction_balance(events, donor_id);
        let balance = BalanceSection {
            summary: summarize_balance(&records, self.balanced_below),
            records,
        };

        let conversations: BTreeSet<&str> =
            events.iter().map(|e| e.conversation_id.as_str()).collect();

        Ok(DonorReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            donor_id: donor_id.to_string(),
            computed_at_utc: Utc::now().to_rfc3339(),
            event_count: events.len(),
            conversation_count: conversations.len(),
            burstiness,
            inequality,
            balance,
        })
    }

    /// Encode to a JSON string
    pub fn encode_to_json(&self, donor_id: &str, events: &[Event]) -> Result<String, AnalysisError> {
        let report = self.encode(donor_id, events)?;
        serde_json::to_string_pretty(&report).map_err(AnalysisError::JsonError)
    }
}
