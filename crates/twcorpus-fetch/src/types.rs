//! Lookup endpoint response types.
//!
//! Post and error objects are kept as raw JSON: error entries are persisted
//! verbatim and raw-mode output writes posts untouched, so only the envelope
//! is typed.

use serde::Deserialize;
use serde_json::Value;

/// Body of a successful `GET /2/tweets` call.
///
/// Both keys are optional on the wire; a batch where every id failed carries
/// only `errors`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub errors: Vec<Value>,
}

/// What one lookup attempt produced, short of a fatal error.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// HTTP 200 with a parsed body.
    Resolved(LookupResponse),
    /// HTTP 429 or 503; the same batch should be retried after a rest.
    Transient { status: u16, body: String },
}

/// Reads an identifier-like field as a string.
///
/// The endpoint sends identifiers as strings, but numeric ids are accepted
/// and rendered in decimal.
pub(crate) fn id_field(object: &Value, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
