//! Dataset ingestion
//!
//! Loads the donation and message tables, resolves which messages belong to
//! a donor (messages join donations on `donation_id`, donations carry the
//! `donor_id`), and produces the filtered, immutable event views that the
//! estimators consume. Input is NDJSON (one row per line) or a JSON array,
//! detected automatically.

use crate::error::AnalysisError;
use crate::types::Event;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeSet;

/// One row of the donation table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationRow {
    pub donation_id: String,
    pub donor_id: String,
    /// Originating platform of the donation (e.g. "WhatsApp")
    pub source: String,
}

/// One row of the message table, as donated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRow {
    pub donation_id: String,
    pub conversation_id: String,
    pub sender_id: String,
    /// Timestamp string; RFC 3339 or "YYYY-MM-DD HH:MM:SS"
    pub datetime: String,
    pub word_count: u64,
}

/// An immutable, loaded dataset: the explicit handle passed into every
/// analysis request. There is no module-level state; concurrent requests
/// each hold their own reference to one `Dataset`.
#[derive(Debug, Clone)]
pub struct Dataset {
    donations: Vec<DonationRow>,
    /// (donation_id, parsed event) pairs, message order preserved
    messages: Vec<(String, Event)>,
}

impl Dataset {
    /// Parse the two tables from NDJSON or JSON-array text.
    ///
    /// Messages referencing a donation id absent from the donation table are
    /// dropped, mirroring the join the donation platform performs. Malformed
    /// rows and unparseable timestamps fail loudly.
    pub fn from_json(donations_json: &str, messages_json: &str) -> Result<Self, AnalysisError> {
        let donations: Vec<DonationRow> = parse_rows(donations_json)?;
        let rows: Vec<MessageRow> = parse_rows(messages_json)?;

        let donation_ids: BTreeSet<&str> =
            donations.iter().map(|d| d.donation_id.as_str()).collect();

        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            if !donation_ids.contains(row.donation_id.as_str()) {
                continue;
            }
            let timestamp = parse_timestamp(&row.datetime)?;
            messages.push((
                row.donation_id,
                Event {
                    conversation_id: row.conversation_id,
                    sender_id: row.sender_id,
                    timestamp,
                    word_count: row.word_count,
                },
            ));
        }

        Ok(Self {
            donations,
            messages,
        })
    }

    /// Keep only donations from one source (and their messages)
    pub fn restrict_to_source(self, source: &str) -> Self {
        let donations: Vec<DonationRow> = self
            .donations
            .into_iter()
            .filter(|d| d.source == source)
            .collect();
        let remaining: BTreeSet<&str> = donations.iter().map(|d| d.donation_id.as_str()).collect();
        let messages = self
            .messages
            .into_iter()
            .filter(|(donation_id, _)| remaining.contains(donation_id.as_str()))
            .collect();
        Self {
            donations,
            messages,
        }
    }

    /// All distinct donor ids, ascending
    pub fn donor_ids(&self) -> Vec<String> {
        let ids: BTreeSet<&str> = self.donations.iter().map(|d| d.donor_id.as_str()).collect();
        ids.into_iter().map(str::to_string).collect()
    }

    /// Every event (sent and received) belonging to one donor's donations.
    ///
    /// An unknown donor id is propagated as an error; the core never guesses
    /// or silently falls back to an empty result.
    pub fn donor_events(&self, donor_id: &str) -> Result<Vec<Event>, AnalysisError> {
        let donation_ids: BTreeSet<&str> = self
            .donations
            .iter()
            .filter(|d| d.donor_id == donor_id)
            .map(|d| d.donation_id.as_str())
            .collect();

        if donation_ids.is_empty() {
            return Err(AnalysisError::UnknownDonor(donor_id.to_string()));
        }

        Ok(self
            .messages
            .iter()
            .filter(|(donation_id, _)| donation_ids.contains(donation_id.as_str()))
            .map(|(_, event)| event.clone())
            .collect())
    }

    pub fn donation_count(&self) -> usize {
        self.donations.len()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

/// Restrict events to one conversation; unknown ids are an error, not an
/// empty result.
pub fn filter_conversation(
    events: Vec<Event>,
    conversation_id: &str,
) -> Result<Vec<Event>, AnalysisError> {
    if !events.iter().any(|e| e.conversation_id == conversation_id) {
        return Err(AnalysisError::UnknownConversation(
            conversation_id.to_string(),
        ));
    }
    Ok(events
        .into_iter()
        .filter(|e| e.conversation_id == conversation_id)
        .collect())
}

/// Restrict events to an inclusive calendar-day range. Open bounds pass
/// everything on that side.
pub fn filter_date_range(
    events: Vec<Event>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<Event> {
    events
        .into_iter()
        .filter(|e| {
            let day = e.day();
            start.map_or(true, |s| day >= s) && end.map_or(true, |e| day <= e)
        })
        .collect()
}

/// Only the events the donor authored
pub fn sent_only(events: &[Event], donor_id: &str) -> Vec<Event> {
    events
        .iter()
        .filter(|e| e.sent_by(donor_id))
        .cloned()
        .collect()
}

fn parse_rows<T: DeserializeOwned>(data: &str) -> Result<Vec<T>, AnalysisError> {
    let trimmed = data.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    let mut rows = Vec::new();
    for (line_no, line) in trimmed.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row: T = serde_json::from_str(line).map_err(|e| {
            AnalysisError::ParseError(format!("line {}: {}", line_no + 1, e))
        })?;
        rows.push(row);
    }
    Ok(rows)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AnalysisError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(AnalysisError::InvalidTimestamp(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn donations_ndjson() -> &'static str {
        concat!(
            "{\"donation_id\":\"don-1\",\"donor_id\":\"alice\",\"source\":\"WhatsApp\"}\n",
            "{\"donation_id\":\"don-2\",\"donor_id\":\"bob\",\"source\":\"WhatsApp\"}\n",
            "{\"donation_id\":\"don-3\",\"donor_id\":\"alice\",\"source\":\"Telegram\"}\n",
        )
    }

    fn messages_ndjson() -> &'static str {
        concat!(
            "{\"donation_id\":\"don-1\",\"conversation_id\":\"c1\",\"sender_id\":\"alice\",\"datetime\":\"2024-01-05 09:30:00\",\"word_count\":4}\n",
            "{\"donation_id\":\"don-1\",\"conversation_id\":\"c1\",\"sender_id\":\"carol\",\"datetime\":\"2024-01-05T10:00:00\",\"word_count\":6}\n",
            "{\"donation_id\":\"don-2\",\"conversation_id\":\"c9\",\"sender_id\":\"bob\",\"datetime\":\"2024-01-06T08:00:00Z\",\"word_count\":2}\n",
            "{\"donation_id\":\"don-3\",\"conversation_id\":\"c2\",\"sender_id\":\"alice\",\"datetime\":\"2024-02-01 12:00:00\",\"word_count\":9}\n",
            "{\"donation_id\":\"orphan\",\"conversation_id\":\"cx\",\"sender_id\":\"x\",\"datetime\":\"2024-02-01 12:00:00\",\"word_count\":1}\n",
        )
    }

    #[test]
    fn test_load_and_join() {
        let dataset = Dataset::from_json(donations_ndjson(), messages_ndjson()).unwrap();
        assert_eq!(dataset.donation_count(), 3);
        // orphan message dropped by the join
        assert_eq!(dataset.message_count(), 4);
        assert_eq!(dataset.donor_ids(), vec!["alice".to_string(), "bob".to_string()]);
    }

    #[test]
    fn test_json_array_input() {
        let donations = r#"[{"donation_id":"d1","donor_id":"a","source":"WhatsApp"}]"#;
        let messages = r#"[{"donation_id":"d1","conversation_id":"c","sender_id":"a","datetime":"2024-03-01 08:00:00","word_count":3}]"#;
        let dataset = Dataset::from_json(donations, messages).unwrap();
        assert_eq!(dataset.message_count(), 1);
    }

    #[test]
    fn test_donor_events_spans_donations() {
        let dataset = Dataset::from_json(donations_ndjson(), messages_ndjson()).unwrap();
        // alice has don-1 (2 messages, sent and received) and don-3 (1)
        let events = dataset.donor_events("alice").unwrap();
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn test_unknown_donor_is_an_error() {
        let dataset = Dataset::from_json(donations_ndjson(), messages_ndjson()).unwrap();
        assert!(matches!(
            dataset.donor_events("nobody"),
            Err(AnalysisError::UnknownDonor(_))
        ));
    }

    #[test]
    fn test_restrict_to_source() {
        let dataset = Dataset::from_json(donations_ndjson(), messages_ndjson())
            .unwrap()
            .restrict_to_source("WhatsApp");
        assert_eq!(dataset.donation_count(), 2);
        // alice's Telegram donation is gone
        let events = dataset.donor_events("alice").unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_filter_conversation() {
        let dataset = Dataset::from_json(donations_ndjson(), messages_ndjson()).unwrap();
        let events = dataset.donor_events("alice").unwrap();

        let filtered = filter_conversation(events.clone(), "c1").unwrap();
        assert_eq!(filtered.len(), 2);

        assert!(matches!(
            filter_conversation(events, "missing"),
            Err(AnalysisError::UnknownConversation(_))
        ));
    }

    #[test]
    fn test_filter_date_range_inclusive() {
        let dataset = Dataset::from_json(donations_ndjson(), messages_ndjson()).unwrap();
        let events = dataset.donor_events("alice").unwrap();

        let jan5 = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let within = filter_date_range(events.clone(), Some(jan5), Some(jan5));
        assert_eq!(within.len(), 2);

        let open_start = filter_date_range(events, None, Some(jan5));
        assert_eq!(open_start.len(), 2);
    }

    #[test]
    fn test_sent_only() {
        let dataset = Dataset::from_json(donations_ndjson(), messages_ndjson()).unwrap();
        let events = dataset.donor_events("alice").unwrap();
        let sent = sent_only(&events, "alice");
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|e| e.sender_id == "alice"));
    }

    #[test]
    fn test_invalid_timestamp_fails_loudly() {
        let donations = r#"{"donation_id":"d1","donor_id":"a","source":"WhatsApp"}"#;
        let messages = r#"{"donation_id":"d1","conversation_id":"c","sender_id":"a","datetime":"not a time","word_count":3}"#;
        assert!(matches!(
            Dataset::from_json(donations, messages),
            Err(AnalysisError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let donations = "{\"donation_id\":\"d1\",\"donor_id\":\"a\",\"source\":\"s\"}\nnot json\n";
        let err = Dataset::from_json(donations, "").unwrap_err();
        match err {
            AnalysisError::ParseError(message) => assert!(message.contains("line 2")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
