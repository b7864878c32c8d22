use thiserror::Error;

/// Errors returned by the collection tools.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("I/O error on {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A line could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A lookup line has no string under the index key.
    #[error("{path} line {line} has no string `{key}` field")]
    MissingKey {
        path: String,
        line: usize,
        key: String,
    },

    /// A run line does not have the six TREC run columns.
    #[error("malformed run line in {path} at line {line}: {reason}")]
    MalformedRun {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("malformed qrels line in {path} at line {line}")]
    MalformedQrels { path: String, line: usize },

    #[error("{0} already exists; pass --overwrite to replace it")]
    OutputExists(String),
}

impl CollectionError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn deserialize(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Deserialize {
            context: context.into(),
            source,
        }
    }
}
