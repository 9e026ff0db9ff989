//! Interaction balance estimation
//!
//! Measures how equally the donor and their contacts contribute words to each
//! conversation. Per-conversation bias is `0.5 - donor_words / total_words`:
//! negative when the donor sends more, positive when contacts send more, and
//! undefined for conversations with no words on either side.

use crate::types::{BalanceStyle, BalanceSummary, Event, InteractionBalanceRecord};

/// Default threshold under which the mean |bias| counts as "Balanced"
pub const DEFAULT_BALANCED_BELOW: f64 = 0.05;

/// Per-conversation sent/received word totals and bias, one record per
/// distinct conversation id, in ascending conversation-id order.
pub fn compute_interaction_balance(
    events: &[Event],
    donor_id: &str,
) -> Vec<InteractionBalanceRecord> {
    let mut totals: std::collections::BTreeMap<&str, (u64, u64)> =
        std::collections::BTreeMap::new();

    for event in events {
        let entry = totals.entry(event.conversation_id.as_str()).or_insert((0, 0));
        if event.sent_by(donor_id) {
            entry.0 += event.word_count;
        } else {
            entry.1 += event.word_count;
        }
    }

    totals
        .into_iter()
        .map(|(conversation_id, (donor_words, contact_words))| {
            let total = donor_words + contact_words;
            let bias = if total == 0 {
                None
            } else {
                Some(0.5 - donor_words as f64 / total as f64)
            };
            InteractionBalanceRecord {
                conversation_id: conversation_id.to_string(),
                donor_words,
                contact_words,
                bias,
            }
        })
        .collect()
}

/// Donor-level rollup of defined biases: mean, median, and style label.
///
/// Records with an undefined bias are excluded before aggregation. Returns
/// `None` when no record has a defined bias.
///
/// Style boundary rule: the Balanced test is strict, so a mean bias of
/// exactly `balanced_below` in absolute value is not Balanced.
pub fn summarize_balance(
    records: &[InteractionBalanceRecord],
    balanced_below: f64,
) -> Option<BalanceSummary> {
    let mut biases: Vec<f64> = records.iter().filter_map(|r| r.bias).collect();
    if biases.is_empty() {
        return None;
    }

    let mean = biases.iter().sum::<f64>() / biases.len() as f64;
    biases.sort_by(|a, b| a.total_cmp(b));
    let median = if biases.len() % 2 == 1 {
        biases[biases.len() / 2]
    } else {
        let upper = biases.len() / 2;
        (biases[upper - 1] + biases[upper]) / 2.0
    };

    let style = if mean.abs() < balanced_below {
        BalanceStyle::Balanced
    } else if mean < 0.0 {
        BalanceStyle::DonorDominant
    } else {
        BalanceStyle::ContactDominant
    };

    Some(BalanceSummary {
        mean_bias: mean,
        median_bias: median,
        defined_chats: biases.len(),
        style,
    })
}
