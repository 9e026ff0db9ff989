//! Daily time-series
//!
//! Per-day totals over the full calendar range of a donor's events: words
//! per day, messages per day, or distinct active conversations per day,
//! plus a trailing moving average for smoothing.

use crate::error::AnalysisError;
use crate::types::Event;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Which per-day quantity the series carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DailyMetric {
    /// Sum of word counts per day
    Words,
    /// Number of messages per day
    Messages,
    /// Number of distinct conversations with at least one event per day
    ActiveConversations,
}

/// A per-day value series over a contiguous day range.
///
/// `days` and `values` have equal length; days without events carry 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    pub metric: DailyMetric,
    pub days: Vec<NaiveDate>,
    pub values: Vec<u64>,
}

/// Build a daily series over the inclusive [min event day, max event day]
/// range, zero-filled for days without events.
pub fn daily_series(events: &[Event], metric: DailyMetric) -> Result<DailySeries, AnalysisError> {
    if events.is_empty() {
        return Err(AnalysisError::EmptyInput(
            "daily series needs at least one event".to_string(),
        ));
    }

    let min_day = events.iter().map(Event::day).min().unwrap();
    let max_day = events.iter().map(Event::day).max().unwrap();

    let per_day: BTreeMap<NaiveDate, u64> = match metric {
        DailyMetric::Words | DailyMetric::Messages => {
            let mut totals: BTreeMap<NaiveDate, u64> = BTreeMap::new();
            for event in events {
                let increment = match metric {
                    DailyMetric::Words => event.word_count,
                    _ => 1,
                };
                *totals.entry(event.day()).or_insert(0) += increment;
            }
            totals
        }
        DailyMetric::ActiveConversations => {
            let mut chats: BTreeMap<NaiveDate, BTreeSet<&str>> = BTreeMap::new();
            for event in events {
                chats
                    .entry(event.day())
                    .or_default()
                    .insert(event.conversation_id.as_str());
            }
            chats
                .into_iter()
                .map(|(day, set)| (day, set.len() as u64))
                .collect()
        }
    };

    let mut days = Vec::new();
    let mut values = Vec::new();
    let mut day = min_day;
    while day <= max_day {
        days.push(day);
        values.push(per_day.get(&day).copied().unwrap_or(0));
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    Ok(DailySeries {
        metric,
        days,
        values,
    })
}

/// Trailing moving average with a minimum window of 1: the first values
/// average over however many points exist so far, so the output has the same
/// length as the input.
pub fn moving_average(values: &[u64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut averaged = Vec::with_capacity(values.len());
    let mut running_sum = 0u64;

    for i in 0..values.len() {
        running_sum += values[i];
        if i >= window {
            running_sum -= values[i - window];
        }
        let span = (i + 1).min(window);
        averaged.push(running_sum as f64 / span as f64);
    }
    averaged
}
