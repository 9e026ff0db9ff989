//! Inequality estimation
//!
//! Quantifies how unevenly a donor's attention is distributed across
//! contacts: the Gini coefficient over per-conversation counts (messages or
//! summed words) and the Lorenz curve behind it.

use crate::types::{CountMetric, Event, LorenzPoint};
use std::collections::BTreeMap;

/// Gini coefficient over a mapping of contact id -> non-negative count.
///
/// Values are sorted ascending and rank-weighted:
/// `G = (2 * sum(rank_i * value_i)) / (n * total) - (n + 1) / n`.
///
/// An empty mapping or an all-zero mapping returns 0.0 by convention
/// (perfect equality), not an error; downstream summaries rely on this.
pub fn calculate_gini(counts: &BTreeMap<String, u64>) -> f64 {
    let mut values: Vec<u64> = counts.values().copied().collect();
    values.sort_unstable();

    let n = values.len();
    let total: u64 = values.iter().sum();
    if n == 0 || total == 0 {
        return 0.0;
    }

    let weighted_sum: f64 = values
        .iter()
        .enumerate()
        .map(|(i, &value)| (i as f64 + 1.0) * value as f64)
        .sum();

    (2.0 * weighted_sum) / (n as f64 * total as f64) - (n as f64 + 1.0) / n as f64
}

/// Lorenz curve coordinates for a counts mapping.
///
/// Values are sorted ascending and cumulatively summed, normalized by the
/// total, with a (0, 0) origin prefixed. The curve ends at (1, 1) and its
/// value coordinate is non-decreasing.
///
/// Returns `None` when the total is zero: there is nothing to plot, which is
/// a defined outcome rather than a degenerate division.
pub fn lorenz_curve(counts: &BTreeMap<String, u64>) -> Option<Vec<LorenzPoint>> {
    let mut values: Vec<u64> = counts.values().copied().collect();
    values.sort_unstable();

    let total: u64 = values.iter().sum();
    if total == 0 {
        return None;
    }

    let n = values.len() as f64;
    let mut points = Vec::with_capacity(values.len() + 1);
    points.push(LorenzPoint {
        population_frac: 0.0,
        value_frac: 0.0,
    });

    let mut cumulative = 0u64;
    for (i, value) in values.iter().enumerate() {
        cumulative += value;
        points.push(LorenzPoint {
            population_frac: (i as f64 + 1.0) / n,
            value_frac: cumulative as f64 / total as f64,
        });
    }

    Some(points)
}

/// Per-conversation counts of the donor's sent messages or words.
///
/// Only events authored by the donor contribute, matching the attention
/// question the Gini answers: how the donor spreads their own output.
pub fn conversation_counts(
    events: &[Event],
    donor_id: &str,
    metric: CountMetric,
) -> BTreeMap<String, u64> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for event in events.iter().filter(|e| e.sent_by(donor_id)) {
        let increment = match metric {
            CountMetric::Messages => 1,
            CountMetric::Words => event.word_count,
        };
        *counts.entry(event.conversation_id.clone()).or_insert(0) += increment;
    }
    counts
}
