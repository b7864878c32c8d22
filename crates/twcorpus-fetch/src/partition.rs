//! Splitting a lookup response into records and per-identifier errors.

use serde::Serialize;
use serde_json::Value;

use crate::ledger::Ledger;
use crate::normalize::{normalize_tweet, Record};
use crate::types::{id_field, LookupResponse};

/// How posts are written to the record output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Normalized [`Record`]s.
    #[default]
    Normalized,
    /// Post objects exactly as the endpoint returned them.
    Raw,
}

/// One line destined for the record output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputRecord {
    Normalized(Record),
    Raw(Value),
}

/// The writable halves of one batch response.
#[derive(Debug, Default, PartialEq)]
pub struct Partition {
    pub records: Vec<OutputRecord>,
    /// Error entries exactly as returned, ready for the error output.
    pub errors: Vec<Value>,
    /// Posts that failed validation; not written and not marked resolved.
    pub dropped_records: usize,
    /// Error entries naming no identifier.
    pub dropped_errors: usize,
}

/// Partitions `response`, marking every written identifier as resolved in
/// `ledger`.
pub fn partition(response: LookupResponse, ledger: &mut Ledger, mode: OutputMode) -> Partition {
    let mut out = Partition::default();

    for entry in response.errors {
        match id_field(&entry, "resource_id").or_else(|| id_field(&entry, "value")) {
            Some(id) => {
                ledger.insert(id);
                out.errors.push(entry);
            }
            None => {
                tracing::warn!(
                    entry = %entry,
                    "error entry names no identifier; needs manual fetch"
                );
                out.dropped_errors += 1;
            }
        }
    }

    for tweet in response.data {
        let record = match mode {
            OutputMode::Normalized => normalize_tweet(&tweet).map(OutputRecord::Normalized),
            OutputMode::Raw => id_field(&tweet, "id").map(|_| OutputRecord::Raw(tweet)),
        };
        match record {
            Some(record) => {
                ledger.insert(record.tweet_id());
                out.records.push(record);
            }
            None => out.dropped_records += 1,
        }
    }

    out
}

impl OutputRecord {
    #[must_use]
    pub fn tweet_id(&self) -> String {
        match self {
            Self::Normalized(record) => record.tweetid.clone(),
            Self::Raw(tweet) => id_field(tweet, "id").unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn response(body: Value) -> LookupResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn valid_post_becomes_record_and_is_resolved() {
        let mut ledger = Ledger::new();
        let part = partition(
            response(json!({"data": [{
                "id": "5", "author_id": "9", "text": "hello world",
                "lang": "en", "created_at": "2021-05-01T00:00:00Z"
            }]})),
            &mut ledger,
            OutputMode::Normalized,
        );
        assert_eq!(part.records.len(), 1);
        assert_eq!(
            serde_json::to_value(&part.records[0]).unwrap(),
            json!({
                "tweetid": "5", "authorid": "9", "text": "hello world",
                "lang": "en", "date": "2021-05-01", "url": "twitter.com/anyuser/status/5"
            })
        );
        assert!(ledger.contains("5"));
    }

    #[test]
    fn suspended_post_is_neither_written_nor_resolved() {
        let mut ledger = Ledger::new();
        let part = partition(
            response(json!({"data": [{
                "id": "6",
                "text": "...account is temporarily unavailable because it violates the Twitter Media Policy. Learn more."
            }]})),
            &mut ledger,
            OutputMode::Normalized,
        );
        assert!(part.records.is_empty());
        assert_eq!(part.dropped_records, 1);
        assert!(!ledger.contains("6"));
    }

    #[test]
    fn error_entry_is_resolved_and_kept_verbatim() {
        let mut ledger = Ledger::new();
        let entry = json!({"value": "7", "title": "Not Found Error"});
        let part = partition(
            response(json!({"errors": [entry.clone()]})),
            &mut ledger,
            OutputMode::Normalized,
        );
        assert_eq!(part.errors, vec![entry]);
        assert!(ledger.contains("7"));
    }

    #[test]
    fn resource_id_takes_precedence_over_value() {
        let mut ledger = Ledger::new();
        partition(
            response(json!({"errors": [{"resource_id": "11", "value": "12"}]})),
            &mut ledger,
            OutputMode::Normalized,
        );
        assert!(ledger.contains("11"));
        assert!(!ledger.contains("12"));
    }

    #[test]
    fn anonymous_error_entry_is_dropped() {
        let mut ledger = Ledger::new();
        let part = partition(
            response(json!({"errors": [{"title": "Something"}]})),
            &mut ledger,
            OutputMode::Normalized,
        );
        assert!(part.errors.is_empty());
        assert_eq!(part.dropped_errors, 1);
        assert!(ledger.is_empty());
    }

    #[test]
    fn raw_mode_keeps_posts_untouched() {
        let mut ledger = Ledger::new();
        let post = json!({"id": "20", "text": "  spaced   out ", "extra": {"k": 1}});
        let part = partition(
            response(json!({"data": [post.clone(), {"text": "no id"}]})),
            &mut ledger,
            OutputMode::Raw,
        );
        assert_eq!(part.records, vec![OutputRecord::Raw(post)]);
        assert_eq!(part.dropped_records, 1);
        assert!(ledger.contains("20"));
    }
}
