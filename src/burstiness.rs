//! Burstiness estimation
//!
//! Computes inter-event-interval statistics over a donor's message days and
//! derives two burstiness indices:
//!
//! - B1 = (r - 1) / (r + 1), the classic index, where r = sigma / mu of the
//!   gaps in whole days between consecutive distinct event days
//! - B2, a second-order refinement that reduces the small-sample bias of B1
//!
//! Fewer than 2 distinct days means there are no intervals, so the result is
//! the explicit undefined marker rather than any numeric default.

use crate::types::{
    BurstinessClass, BurstinessResult, BurstinessThresholds, ChatBurstiness, Event,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Compute (B1, B2) from a set of event days.
///
/// Days are deduplicated and sorted before intervals are taken, so the input
/// order does not matter and repeated days contribute nothing.
pub fn compute_burstiness(days: &[NaiveDate]) -> BurstinessResult {
    let distinct: BTreeSet<NaiveDate> = days.iter().copied().collect();
    if distinct.len() < 2 {
        return BurstinessResult::UNDEFINED;
    }

    let sorted: Vec<NaiveDate> = distinct.into_iter().collect();
    let intervals: Vec<f64> = sorted
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_days() as f64)
        .collect();

    let mu = intervals.iter().sum::<f64>() / intervals.len() as f64;
    if mu == 0.0 {
        return BurstinessResult::UNDEFINED;
    }

    // Population standard deviation (ddof = 0)
    let variance = intervals
        .iter()
        .map(|gap| (gap - mu).powi(2))
        .sum::<f64>()
        / intervals.len() as f64;
    let sigma = variance.sqrt();

    let r = sigma / mu;
    let b1 = if r + 1.0 == 0.0 {
        None
    } else {
        Some((r - 1.0) / (r + 1.0))
    };

    let n = sorted.len() as f64;
    let numerator = (n + 1.0).sqrt() * r - (n - 1.0).sqrt();
    let denominator = ((n + 1.0).sqrt() - 2.0) * r + (n - 1.0).sqrt();
    let b2 = if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    };

    BurstinessResult { b1, b2 }
}

/// Map a B1 value to its categorical label.
///
/// Boundary rule: B1 exactly at either threshold is `Random` (both
/// comparisons are strict). An absent or non-finite B1 is `NotAvailable`.
pub fn classify_b1(b1: Option<f64>, thresholds: &BurstinessThresholds) -> BurstinessClass {
    match b1 {
        Some(value) if value.is_finite() => {
            if value < thresholds.regular_below {
                BurstinessClass::Regular
            } else if value > thresholds.bursty_above {
                BurstinessClass::Bursty
            } else {
                BurstinessClass::Random
            }
        }
        _ => BurstinessClass::NotAvailable,
    }
}

/// Per-conversation burstiness for one donor's events.
///
/// Conversations are grouped and emitted in ascending conversation-id order,
/// which makes the first-encountered tie-breaks of the donor-level views
/// deterministic regardless of input order.
pub fn burstiness_by_conversation(
    events: &[Event],
    thresholds: &BurstinessThresholds,
) -> Vec<ChatBurstiness> {
    let mut days_by_chat: BTreeMap<&str, BTreeSet<NaiveDate>> = BTreeMap::new();
    for event in events {
        days_by_chat
            .entry(event.conversation_id.as_str())
            .or_default()
            .insert(event.day());
    }

    days_by_chat
        .into_iter()
        .map(|(conversation_id, days)| {
            let event_days: Vec<NaiveDate> = days.into_iter().collect();
            let result = compute_burstiness(&event_days);
            let class = classify_b1(result.b1, thresholds);
            ChatBurstiness {
                conversation_id: conversation_id.to_string(),
                event_days,
                result,
                class,
            }
        })
        .collect()
}

/// Aggregate view: union of all event days across every conversation,
/// treated as a single day-set.
pub fn aggregate_burstiness(events: &[Event]) -> BurstinessResult {
    let days: Vec<NaiveDate> = events.iter().map(Event::day).collect();
    compute_burstiness(&days)
}

/// One dominant classification label and its representative conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominantBehavior {
    pub class: BurstinessClass,
    /// Number of conversations carrying this label
    pub count: usize,
    /// First conversation (in conversation-id order) with this label
    pub example: ChatBurstiness,
}

/// Dominant view: the classification label(s) with the maximum occurrence
/// count across conversations. Ties produce one entry per tied label, each
/// represented by its first-encountered conversation.
///
/// Conversations with an undefined B1 are excluded from the counting.
pub fn dominant_behavior(chats: &[ChatBurstiness]) -> Vec<DominantBehavior> {
    let mut counts: Vec<(BurstinessClass, usize)> = Vec::new();
    for chat in chats {
        if chat.class == BurstinessClass::NotAvailable {
            continue;
        }
        match counts.iter_mut().find(|(class, _)| *class == chat.class) {
            Some((_, count)) => *count += 1,
            None => counts.push((chat.class, 1)),
        }
    }

    let max_count = match counts.iter().map(|(_, count)| *count).max() {
        Some(max) => max,
        None => return Vec::new(),
    };

    counts
        .into_iter()
        .filter(|(_, count)| *count == max_count)
        .filter_map(|(class, count)| {
            // first conversation carrying this label represents it
            chats
                .iter()
                .find(|chat| chat.class == class)
                .map(|example| DominantBehavior {
                    class,
                    count,
                    example: example.clone(),
                })
        })
        .collect()
}

/// Extreme view: the conversation with the largest |B1|.
///
/// Undefined results are excluded; ties keep the first occurrence.
pub fn most_extreme_chat(chats: &[ChatBurstiness]) -> Option<&ChatBurstiness> {
    chats
        .iter()
        .filter_map(|chat| chat.result.b1.map(|b1| (chat, b1.abs())))
        .fold(None, |best: Option<(&ChatBurstiness, f64)>, (chat, abs_b1)| {
            match best {
                Some((_, best_abs)) if best_abs >= abs_b1 => best,
                _ => Some((chat, abs_b1)),
            }
        })
        .map(|(chat, _)| chat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn event(conversation: &str, day: u32) -> Event {
        Event {
            conversation_id: conversation.to_string(),
            sender_id: "donor".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
            word_count: 1,
        }
    }

    #[test]
    fn test_empty_and_single_day_are_undefined() {
        assert_eq!(compute_burstiness(&[]), BurstinessResult::UNDEFINED);
        assert_eq!(compute_burstiness(&[day(5)]), BurstinessResult::UNDEFINED);
        // duplicates of one day still mean a single distinct day
        assert_eq!(
            compute_burstiness(&[day(5), day(5), day(5)]),
            BurstinessResult::UNDEFINED
        );
    }

    #[test]
    fn test_perfectly_regular_pattern() {
        // 10 consecutive days: all gaps are 1, sigma = 0, r = 0, B1 = -1
        let days: Vec<NaiveDate> = (1..=10).map(day).collect();
        let result = compute_burstiness(&days);

        assert_eq!(result.b1, Some(-1.0));
        assert_eq!(
            classify_b1(result.b1, &BurstinessThresholds::default()),
            BurstinessClass::Regular
        );
    }

    #[test]
    fn test_b2_for_regular_pattern() {
        // r = 0 makes B2 = -sqrt(n-1) / sqrt(n-1) = -1
        let days: Vec<NaiveDate> = (1..=10).map(day).collect();
        let result = compute_burstiness(&days);
        assert!((result.b2.unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bursty_pattern_has_positive_b1() {
        // Tight cluster then a long silence then another cluster
        let days = vec![day(1), day(2), day(3), day(28), day(29), day(30)];
        let result = compute_burstiness(&days);
        assert!(result.b1.unwrap() > 0.2);
        assert_eq!(
            classify_b1(result.b1, &BurstinessThresholds::default()),
            BurstinessClass::Bursty
        );
    }

    #[test]
    fn test_two_days_r_is_zero() {
        // One interval: sigma over a single gap is 0, so B1 = -1
        let result = compute_burstiness(&[day(1), day(9)]);
        assert_eq!(result.b1, Some(-1.0));
    }

    #[test]
    fn test_classification_boundaries_are_random() {
        let thresholds = BurstinessThresholds::default();
        assert_eq!(classify_b1(Some(-0.2), &thresholds), BurstinessClass::Random);
        assert_eq!(classify_b1(Some(0.2), &thresholds), BurstinessClass::Random);
        assert_eq!(
            classify_b1(Some(-0.2000001), &thresholds),
            BurstinessClass::Regular
        );
        assert_eq!(
            classify_b1(Some(0.2000001), &thresholds),
            BurstinessClass::Bursty
        );
    }

    #[test]
    fn test_undefined_classifies_not_available() {
        let thresholds = BurstinessThresholds::default();
        assert_eq!(classify_b1(None, &thresholds), BurstinessClass::NotAvailable);
        assert_eq!(
            classify_b1(Some(f64::NAN), &thresholds),
            BurstinessClass::NotAvailable
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = BurstinessThresholds {
            regular_below: -0.5,
            bursty_above: 0.5,
        };
        assert_eq!(classify_b1(Some(-0.3), &thresholds), BurstinessClass::Random);
        assert_eq!(classify_b1(Some(0.6), &thresholds), BurstinessClass::Bursty);
    }

    #[test]
    fn test_by_conversation_sorted_and_grouped() {
        let events = vec![
            event("chat-z", 1),
            event("chat-a", 1),
            event("chat-z", 2),
            event("chat-a", 5),
            event("chat-a", 5),
        ];

        let chats = burstiness_by_conversation(&events, &BurstinessThresholds::default());
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].conversation_id, "chat-a");
        assert_eq!(chats[0].event_days, vec![day(1), day(5)]);
        assert_eq!(chats[1].conversation_id, "chat-z");
    }

    #[test]
    fn test_aggregate_view_unions_days() {
        // Each chat alone has a single day; together they form a day-set
        // with intervals.
        let events = vec![event("c1", 1), event("c2", 2), event("c3", 3)];
        let aggregate = aggregate_burstiness(&events);
        assert_eq!(aggregate.b1, Some(-1.0));
    }

    #[test]
    fn test_dominant_view_tie_break() {
        // [Regular, Bursty, Bursty, Regular] -> both labels tie at 2, each
        // represented by its first conversation in id order.
        let regular = |id: &str| ChatBurstiness {
            conversation_id: id.to_string(),
            event_days: vec![],
            result: BurstinessResult {
                b1: Some(-0.8),
                b2: None,
            },
            class: BurstinessClass::Regular,
        };
        let bursty = |id: &str| ChatBurstiness {
            conversation_id: id.to_string(),
            event_days: vec![],
            result: BurstinessResult {
                b1: Some(0.7),
                b2: None,
            },
            class: BurstinessClass::Bursty,
        };

        let chats = vec![regular("a"), bursty("b"), bursty("c"), regular("d")];
        let dominant = dominant_behavior(&chats);

        assert_eq!(dominant.len(), 2);
        assert_eq!(dominant[0].class, BurstinessClass::Regular);
        assert_eq!(dominant[0].count, 2);
        assert_eq!(dominant[0].example.conversation_id, "a");
        assert_eq!(dominant[1].class, BurstinessClass::Bursty);
        assert_eq!(dominant[1].example.conversation_id, "b");
    }

    #[test]
    fn test_dominant_view_ignores_undefined() {
        let undefined = ChatBurstiness {
            conversation_id: "u".to_string(),
            event_days: vec![day(1)],
            result: BurstinessResult::UNDEFINED,
            class: BurstinessClass::NotAvailable,
        };
        assert!(dominant_behavior(&[undefined.clone()]).is_empty());

        let defined = ChatBurstiness {
            conversation_id: "d".to_string(),
            event_days: vec![],
            result: BurstinessResult {
                b1: Some(0.0),
                b2: Some(0.0),
            },
            class: BurstinessClass::Random,
        };
        let dominant = dominant_behavior(&[undefined, defined]);
        assert_eq!(dominant.len(), 1);
        assert_eq!(dominant[0].class, BurstinessClass::Random);
    }

    #[test]
    fn test_most_extreme_chat() {
        let chat = |id: &str, b1: Option<f64>| ChatBurstiness {
            conversation_id: id.to_string(),
            event_days: vec![],
            result: BurstinessResult { b1, b2: None },
            class: BurstinessClass::Random,
        };

        let chats = vec![
            chat("a", Some(0.3)),
            chat("b", None),
            chat("c", Some(-0.9)),
            chat("d", Some(0.9)), // ties with c on |B1|; c came first
        ];

        let extreme = most_extreme_chat(&chats).unwrap();
        assert_eq!(extreme.conversation_id, "c");

        assert!(most_extreme_chat(&[chat("x", None)]).is_none());
        assert!(most_extreme_chat(&[]).is_none());
    }
}
