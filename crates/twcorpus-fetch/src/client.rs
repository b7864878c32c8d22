//! HTTP client for the tweet lookup endpoint.
//!
//! Wraps `reqwest` with bearer authentication, lookup URL construction and
//! the three-way status classification the backoff loop relies on: 200 is a
//! resolved batch, 429/503 are transient, anything else is fatal.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use twcorpus_core::FetchConfig;

use crate::batch::Batch;
use crate::error::FetchError;
use crate::types::{LookupOutcome, LookupResponse};

const LOOKUP_PATH: &str = "2/tweets";

/// Post fields requested alongside every lookup.
pub const TWEET_FIELDS: &str = "lang,author_id,created_at,conversation_id,referenced_tweets,context_annotations,entities,in_reply_to_user_id";

/// Statuses that mean "rest and retry the same batch".
pub const TRANSIENT_STATUSES: [StatusCode; 2] =
    [StatusCode::TOO_MANY_REQUESTS, StatusCode::SERVICE_UNAVAILABLE];

/// Resolves one batch of identifiers against a lookup backend.
///
/// The backoff state machine drives this seam; [`TweetClient`] is the
/// production implementation.
pub trait BatchResolver {
    /// Performs a single lookup attempt for `batch`.
    ///
    /// Transient failures come back as [`LookupOutcome::Transient`]; only
    /// failures the caller must not retry are returned as errors.
    fn lookup(&self, batch: &Batch) -> impl Future<Output = Result<LookupOutcome, FetchError>>;
}

/// Client for the `GET /2/tweets` lookup endpoint.
///
/// Use [`TweetClient::new`] for production or [`TweetClient::with_base_url`]
/// to point at a mock server in tests.
pub struct TweetClient {
    client: Client,
    bearer_token: String,
    endpoint: Url,
}

impl TweetClient {
    /// Creates a client from the download configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`FetchError::InvalidBaseUrl`] if the configured base URL is invalid.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder().user_agent(config.user_agent.as_str());
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Self::from_parts(builder.build()?, &config.bearer_token, &config.api_base_url)
    }

    /// Creates a client with a custom base URL and no request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`FetchError::InvalidBaseUrl`] if `base_url` is not a valid URL.
    pub fn with_base_url(bearer_token: &str, base_url: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(twcorpus_core::config::DEFAULT_USER_AGENT)
            .build()?;
        Self::from_parts(client, bearer_token, base_url)
    }

    fn from_parts(client: Client, bearer_token: &str, base_url: &str) -> Result<Self, FetchError> {
        // Exactly one trailing slash so the lookup path is appended rather
        // than replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let invalid = |reason: String| FetchError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason,
        };
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join(LOOKUP_PATH))
            .map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            client,
            bearer_token: bearer_token.to_owned(),
            endpoint,
        })
    }

    /// Builds the lookup URL for `batch` with percent-encoded query values.
    #[must_use]
    pub fn lookup_url(&self, batch: &Batch) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("ids", &batch.joined())
            .append_pair("tweet.fields", TWEET_FIELDS);
        url
    }

    async fn lookup_batch(&self, batch: &Batch) -> Result<LookupOutcome, FetchError> {
        let url = self.lookup_url(batch);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::OK {
            let body = response.text().await?;
            let parsed = serde_json::from_str::<LookupResponse>(&body).map_err(|e| {
                FetchError::Deserialize {
                    context: format!("tweet lookup ending with {}", batch.last_id()),
                    source: e,
                }
            })?;
            return Ok(LookupOutcome::Resolved(parsed));
        }

        let body = response.text().await.unwrap_or_default();
        if TRANSIENT_STATUSES.contains(&status) {
            tracing::warn!(
                status = status.as_u16(),
                body = %body,
                "tweet lookup hit a known transient error"
            );
            return Ok(LookupOutcome::Transient {
                status: status.as_u16(),
                body,
            });
        }

        Err(FetchError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        })
    }
}

impl BatchResolver for TweetClient {
    fn lookup(&self, batch: &Batch) -> impl Future<Output = Result<LookupOutcome, FetchError>> {
        self.lookup_batch(batch)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
