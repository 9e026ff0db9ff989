//! Temporal binning engine
//!
//! Builds dense day×hour and day×conversation activity grids from sparse
//! event timestamps. Missing day/column combinations are explicit zeros:
//! every calendar day between the earliest and latest event appears as a row
//! even when nothing happened on it, and the column domain is either fixed
//! (all 24 hours) or the full set of observed conversation ids.

use crate::error::AnalysisError;
use crate::types::{CountMetric, Event};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A dense 2-D activity table: rows are consecutive calendar days, columns
/// are a discrete domain (hours of day, conversation ids).
///
/// `values[row][col]` is the aggregated value for that day/column cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityGrid<C> {
    /// Row domain: every day in the inclusive [min event day, max event day]
    pub days: Vec<NaiveDate>,
    /// Full column domain, ascending
    pub columns: Vec<C>,
    /// Aggregated values, one row per day
    pub values: Vec<Vec<u64>>,
}

impl<C: PartialEq> ActivityGrid<C> {
    /// Look up a cell by day and column, if both are in the domain
    pub fn value(&self, day: NaiveDate, column: &C) -> Option<u64> {
        let row = self.days.iter().position(|d| *d == day)?;
        let col = self.columns.iter().position(|c| c == column)?;
        Some(self.values[row][col])
    }

    /// True if `other` covers the same days and columns
    pub fn same_domain(&self, other: &ActivityGrid<C>) -> bool {
        self.days == other.days && self.columns == other.columns
    }
}

/// How the column domain of a grid is determined
pub enum ColumnDomain<C> {
    /// A fixed, complete domain supplied by the caller (e.g. hours 0-23)
    Fixed(Vec<C>),
    /// The set of distinct column keys observed in the events, ascending
    Observed,
}

/// Cell state of a combined sent/received grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellActivity {
    None,
    SentOnly,
    ReceivedOnly,
    Both,
}

impl CellActivity {
    /// Numeric encoding used in combined grids
    pub fn value(&self) -> u64 {
        match self {
            CellActivity::None => 0,
            CellActivity::SentOnly => 1,
            CellActivity::ReceivedOnly => 2,
            CellActivity::Both => 3,
        }
    }

    pub fn from_value(value: u64) -> Option<CellActivity> {
        match value {
            0 => Some(CellActivity::None),
            1 => Some(CellActivity::SentOnly),
            2 => Some(CellActivity::ReceivedOnly),
            3 => Some(CellActivity::Both),
            _ => None,
        }
    }
}

/// Build a dense activity grid from events.
///
/// Groups events by (row key, column key), sums `value` within each group,
/// then reindexes onto the full day range × column domain with zero fill.
/// Events whose column key falls outside a `Fixed` domain are ignored, the
/// same way a reindex drops unlisted columns.
///
/// Returns `EmptyInput` when `events` is empty: there is no day range to
/// span, and that is a defined "no data" condition rather than a panic.
pub fn build_grid<C, R, K, V>(
    events: &[Event],
    row_key: R,
    col_key: K,
    value: V,
    columns: ColumnDomain<C>,
) -> Result<ActivityGrid<C>, AnalysisError>
where
    C: Ord + Clone,
    R: Fn(&Event) -> NaiveDate,
    K: Fn(&Event) -> C,
    V: Fn(&Event) -> u64,
{
    if events.is_empty() {
        return Err(AnalysisError::EmptyInput(
            "grid construction needs at least one event".to_string(),
        ));
    }

    let min_day = events.iter().map(&row_key).min().unwrap();
    let max_day = events.iter().map(&row_key).max().unwrap();
    let days = day_range(min_day, max_day);

    let column_list: Vec<C> = match columns {
        ColumnDomain::Fixed(cols) => cols,
        ColumnDomain::Observed => {
            let observed: std::collections::BTreeSet<C> = events.iter().map(&col_key).collect();
            observed.into_iter().collect()
        }
    };

    let col_index: BTreeMap<&C, usize> = column_list
        .iter()
        .enumerate()
        .map(|(i, c)| (c, i))
        .collect();

    let mut values = vec![vec![0u64; column_list.len()]; days.len()];

    for event in events {
        let day = row_key(event);
        let col = col_key(event);
        if let Some(&col_idx) = col_index.get(&col) {
            let row_idx = (day - min_day).num_days() as usize;
            values[row_idx][col_idx] += value(event);
        }
    }

    Ok(ActivityGrid {
        days,
        columns: column_list,
        values,
    })
}

/// Day×hour grid of message counts or word sums.
///
/// Columns are always the full 0-23 hour domain.
pub fn day_hour_grid(
    events: &[Event],
    metric: CountMetric,
) -> Result<ActivityGrid<u32>, AnalysisError> {
    build_grid(
        events,
        Event::day,
        Event::hour,
        |e| match metric {
            CountMetric::Messages => 1,
            CountMetric::Words => e.word_count,
        },
        ColumnDomain::Fixed((0..24).collect()),
    )
}

/// Day×conversation grid of message counts.
///
/// Columns are every conversation id observed in the events, ascending.
pub fn day_conversation_grid(events: &[Event]) -> Result<ActivityGrid<String>, AnalysisError> {
    build_grid(
        events,
        Event::day,
        |e| e.conversation_id.clone(),
        |_| 1,
        ColumnDomain::Observed,
    )
}

/// Binarize a grid: a cell is active (1) iff its value >= `threshold`.
pub fn threshold_grid<C: Clone>(grid: &ActivityGrid<C>, threshold: u64) -> ActivityGrid<C> {
    ActivityGrid {
        days: grid.days.clone(),
        columns: grid.columns.clone(),
        values: grid
            .values
            .iter()
            .map(|row| row.iter().map(|&v| u64::from(v >= threshold)).collect())
            .collect(),
    }
}

/// Combine two binary grids into a 4-valued grid:
/// 0 = none, 1 = sent only, 2 = received only, 3 = both.
///
/// Both inputs must share the same day range and column domain.
pub fn combine_binary<C: Ord + Clone>(
    sent: &ActivityGrid<C>,
    received: &ActivityGrid<C>,
) -> Result<ActivityGrid<C>, AnalysisError> {
    if !sent.same_domain(received) {
        return Err(AnalysisError::GridDomainMismatch(
            "sent and received grids cover different days or columns".to_string(),
        ));
    }

    let values = sent
        .values
        .iter()
        .zip(&received.values)
        .map(|(sent_row, rec_row)| {
            sent_row
                .iter()
                .zip(rec_row)
                .map(|(&s, &r)| match (s > 0, r > 0) {
                    (false, false) => CellActivity::None.value(),
                    (true, false) => CellActivity::SentOnly.value(),
                    (false, true) => CellActivity::ReceivedOnly.value(),
                    (true, true) => CellActivity::Both.value(),
                })
                .collect()
        })
        .collect();

    Ok(ActivityGrid {
        days: sent.days.clone(),
        columns: sent.columns.clone(),
        values,
    })
}

/// Day×conversation grid combining the donor's sent activity with received
/// activity into the 4-valued encoding.
///
/// Both component grids are built over the shared domain of all events, so a
/// conversation active only on the received side still appears as a column in
/// the sent grid (as zeros) and vice versa.
pub fn sent_received_grid(
    events: &[Event],
    donor_id: &str,
) -> Result<ActivityGrid<String>, AnalysisError> {
    let sent = build_grid(
        events,
        Event::day,
        |e| e.conversation_id.clone(),
        |e| u64::from(e.sent_by(donor_id)),
        ColumnDomain::Observed,
    )?;
    let received = build_grid(
        events,
        Event::day,
        |e| e.conversation_id.clone(),
        |e| u64::from(!e.sent_by(donor_id)),
        ColumnDomain::Observed,
    )?;

    combine_binary(&threshold_grid(&sent, 1), &threshold_grid(&received, 1))
}

fn day_range(min_day: NaiveDate, max_day: NaiveDate) -> Vec<NaiveDate> {
    let len = (max_day - min_day).num_days() as usize + 1;
    let mut days = Vec::with_capacity(len);
    let mut day = min_day;
    while day <= max_day {
        days.push(day);
        // succ_opt only fails at NaiveDate::MAX, which a real log never reaches
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn event(conversation: &str, sender: &str, day: u32, hour: u32, words: u64) -> Event {
        Event {
            conversation_id: conversation.to_string(),
            sender_id: sender.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap(),
            word_count: words,
        }
    }

    #[test]
    fn test_empty_input_is_defined_failure() {
        let result = day_hour_grid(&[], CountMetric::Messages);
        assert!(matches!(result, Err(AnalysisError::EmptyInput(_))));
    }

    #[test]
    fn test_day_range_reindexing_fills_gap_days() {
        // Events only on day 1 and day 5: days 2, 3, 4 must appear as
        // all-zero rows.
        let events = vec![
            event("c1", "donor", 1, 9, 4),
            event("c1", "donor", 5, 20, 6),
        ];

        let grid = day_hour_grid(&events, CountMetric::Messages).unwrap();
        assert_eq!(grid.days.len(), 5);
        assert_eq!(grid.columns.len(), 24);

        for row in 1..4 {
            assert!(grid.values[row].iter().all(|&v| v == 0));
        }
        assert_eq!(grid.values[0][9], 1);
        assert_eq!(grid.values[4][20], 1);
    }

    #[test]
    fn test_word_sums_per_cell() {
        let events = vec![
            event("c1", "donor", 2, 10, 4),
            event("c2", "donor", 2, 10, 11),
            event("c1", "donor", 2, 11, 5),
        ];

        let grid = day_hour_grid(&events, CountMetric::Words).unwrap();
        assert_eq!(grid.days.len(), 1);
        assert_eq!(grid.values[0][10], 15);
        assert_eq!(grid.values[0][11], 5);
        assert_eq!(grid.values[0][12], 0);
    }

    #[test]
    fn test_conversation_columns_are_complete_and_sorted() {
        let events = vec![
            event("chat-b", "donor", 1, 8, 1),
            event("chat-a", "x", 3, 8, 1),
            event("chat-b", "donor", 3, 9, 1),
        ];

        let grid = day_conversation_grid(&events).unwrap();
        assert_eq!(grid.columns, vec!["chat-a".to_string(), "chat-b".to_string()]);
        assert_eq!(grid.days.len(), 3);
        // chat-a has no activity on day 1 but still has a column
        assert_eq!(grid.values[0][0], 0);
        assert_eq!(grid.values[0][1], 1);
    }

    #[test]
    fn test_threshold_grid() {
        let events = vec![
            event("c1", "donor", 1, 10, 3),
            event("c1", "donor", 1, 10, 3),
            event("c1", "donor", 2, 10, 8),
        ];

        let grid = day_hour_grid(&events, CountMetric::Words).unwrap();
        let binary = threshold_grid(&grid, 7);

        // day 1 hour 10 has 6 words (< 7), day 2 hour 10 has 8 (>= 7)
        assert_eq!(binary.values[0][10], 0);
        assert_eq!(binary.values[1][10], 1);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let events = vec![event("c1", "donor", 1, 0, 5)];
        let grid = day_hour_grid(&events, CountMetric::Words).unwrap();
        let binary = threshold_grid(&grid, 5);
        assert_eq!(binary.values[0][0], 1);
    }

    #[test]
    fn test_sent_received_combined_encoding() {
        let events = vec![
            // day 1: donor writes in c1, contact replies in c1 -> both
            event("c1", "donor", 1, 9, 2),
            event("c1", "contact", 1, 10, 3),
            // day 2: only contact writes in c2 -> received only
            event("c2", "contact", 2, 9, 4),
            // day 3: only donor writes in c1 -> sent only
            event("c1", "donor", 3, 9, 2),
        ];

        let grid = sent_received_grid(&events, "donor").unwrap();
        let c1 = "c1".to_string();
        let c2 = "c2".to_string();
        let day = |d| chrono::NaiveDate::from_ymd_opt(2024, 3, d).unwrap();

        assert_eq!(grid.value(day(1), &c1), Some(CellActivity::Both.value()));
        assert_eq!(grid.value(day(2), &c2), Some(CellActivity::ReceivedOnly.value()));
        assert_eq!(grid.value(day(3), &c1), Some(CellActivity::SentOnly.value()));
        assert_eq!(grid.value(day(2), &c1), Some(CellActivity::None.value()));
    }

    #[test]
    fn test_combine_binary_rejects_mismatched_domains() {
        let a = day_conversation_grid(&[event("c1", "donor", 1, 9, 1)]).unwrap();
        let b = day_conversation_grid(&[event("c2", "donor", 1, 9, 1)]).unwrap();
        assert!(matches!(
            combine_binary(&a, &b),
            Err(AnalysisError::GridDomainMismatch(_))
        ));
    }

    #[test]
    fn test_cell_activity_roundtrip() {
        for cell in [
            CellActivity::None,
            CellActivity::SentOnly,
            CellActivity::ReceivedOnly,
            CellActivity::Both,
        ] {
            assert_eq!(CellActivity::from_value(cell.value()), Some(cell));
        }
        assert_eq!(CellActivity::from_value(4), None);
    }
}
