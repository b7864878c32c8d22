//! Normalization of lookup posts into corpus records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::id_field;

/// Placeholder text the endpoint substitutes for posts from suspended media
/// accounts. Such posts may come back later, so they are never recorded.
pub const SUSPENSION_NOTICE: &str =
    "account is temporarily unavailable because it violates the Twitter Media Policy. Learn more.";

/// A normalized post as persisted to the record output.
///
/// Field order is the serialized column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub tweetid: String,
    pub authorid: String,
    pub text: String,
    pub lang: String,
    pub date: Option<String>,
    pub url: String,
}

/// Collapses every whitespace run to a single space and trims the ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Derives the calendar date from a `created_at` timestamp such as
/// `"2021-05-01T00:00:00.000Z"`.
///
/// Returns `None` when there is no `T` separator or the date part is not a
/// valid `YYYY-MM-DD` date.
#[must_use]
pub fn parse_created_date(created_at: &str) -> Option<NaiveDate> {
    let (date, _) = created_at.split_once('T')?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

#[must_use]
pub fn status_url(tweet_id: &str) -> String {
    format!("twitter.com/anyuser/status/{tweet_id}")
}

/// Picks the post text, preferring `extended_tweet.full_text` over `text`.
fn raw_text(tweet: &Value) -> Option<&str> {
    tweet
        .get("extended_tweet")
        .and_then(|ext| ext.get("full_text"))
        .and_then(Value::as_str)
        .or_else(|| tweet.get("text").and_then(Value::as_str))
}

/// Converts one post object from a lookup response into a [`Record`].
///
/// Returns `None` when the post lacks an id, author, language or usable text,
/// or when its text is the suspension placeholder.
#[must_use]
pub fn normalize_tweet(tweet: &Value) -> Option<Record> {
    let tweetid = id_field(tweet, "id")?;
    let text = collapse_whitespace(raw_text(tweet)?);
    if text.is_empty() {
        return None;
    }
    if text.ends_with(SUSPENSION_NOTICE) {
        tracing::warn!(tweet_id = %tweetid, "post temporarily unavailable; skipping");
        return None;
    }

    let authorid = id_field(tweet, "author_id")?;
    let lang = tweet.get("lang").and_then(Value::as_str)?.to_string();
    let date = tweet
        .get("created_at")
        .and_then(Value::as_str)
        .and_then(parse_created_date)
        .map(|d| d.format("%Y-%m-%d").to_string());
    let url = status_url(&tweetid);

    Some(Record {
        tweetid,
        authorid,
        text,
        lang,
        date,
        url,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn normalizes_complete_post() {
        let tweet = json!({
            "id": "5",
            "author_id": "9",
            "text": "hello world",
            "lang": "en",
            "created_at": "2021-05-01T00:00:00Z"
        });
        let record = normalize_tweet(&tweet).expect("record");
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"tweetid":"5","authorid":"9","text":"hello world","lang":"en","date":"2021-05-01","url":"twitter.com/anyuser/status/5"}"#
        );
    }

    #[test]
    fn suspension_placeholder_is_dropped() {
        let tweet = json!({
            "id": "6",
            "author_id": "1",
            "lang": "en",
            "text": "This account is temporarily unavailable because it violates the Twitter Media Policy. Learn more."
        });
        assert_eq!(normalize_tweet(&tweet), None);
    }

    #[test]
    fn missing_author_or_lang_is_dropped() {
        let no_author = json!({"id": "6", "text": "hi", "lang": "en"});
        let no_lang = json!({"id": "6", "text": "hi", "author_id": "1"});
        assert_eq!(normalize_tweet(&no_author), None);
        assert_eq!(normalize_tweet(&no_lang), None);
    }

    #[test]
    fn missing_id_or_text_is_dropped() {
        assert_eq!(
            normalize_tweet(&json!({"text": "hi", "author_id": "1", "lang": "en"})),
            None
        );
        assert_eq!(
            normalize_tweet(&json!({"id": "1", "author_id": "1", "lang": "en"})),
            None
        );
        assert_eq!(
            normalize_tweet(&json!({"id": "1", "text": " \n\t ", "author_id": "1", "lang": "en"})),
            None
        );
    }

    #[test]
    fn extended_text_wins_and_whitespace_collapses() {
        let tweet = json!({
            "id": "7",
            "author_id": "2",
            "lang": "fa",
            "text": "short",
            "extended_tweet": {"full_text": "  the\nfull\t\ttext  "}
        });
        let record = normalize_tweet(&tweet).unwrap();
        assert_eq!(record.text, "the full text");
        assert_eq!(record.date, None);
    }

    #[test]
    fn created_date_requires_valid_prefix() {
        assert_eq!(
            parse_created_date("2022-02-28T10:00:00.000Z"),
            NaiveDate::from_ymd_opt(2022, 2, 28)
        );
        assert_eq!(parse_created_date("2022-02-28"), None);
        assert_eq!(parse_created_date("2022-02-30T00:00:00Z"), None);
        assert_eq!(parse_created_date("garbageTtime"), None);
    }

    #[test]
    fn malformed_created_at_yields_null_date() {
        let tweet = json!({
            "id": "8", "author_id": "2", "lang": "en", "text": "x", "created_at": "yesterday"
        });
        let record = normalize_tweet(&tweet).unwrap();
        assert_eq!(record.date, None);
        assert!(serde_json::to_string(&record).unwrap().contains(r#""date":null"#));
    }
}
