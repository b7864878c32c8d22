use thiserror::Error;

/// Errors returned by the tweet download pipeline.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The lookup endpoint answered with a status outside 200/429/503.
    #[error("tweet lookup returned an unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// An output line could not be serialized.
    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("a batch must hold between 1 and {max} identifiers, got {len}")]
    InvalidBatch { len: usize, max: usize },

    /// A prior error log line is not a JSON object with a string `value`.
    #[error("malformed error log {path} at line {line}: {reason}")]
    MalformedErrorLog {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("I/O error on {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no tweet identifiers left to process")]
    NothingToProcess,
}

impl FetchError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
