use std::time::Duration;

/// Settings for the tweet download run.
#[derive(Clone)]
pub struct FetchConfig {
    pub bearer_token: String,
    pub api_base_url: String,
    pub user_agent: String,
    /// `None` leaves the transport without a request timeout.
    pub request_timeout_secs: Option<u64>,
    pub long_wait_secs: u64,
    pub default_wait_secs: u64,
    pub max_attempts: u32,
}

impl FetchConfig {
    #[must_use]
    pub fn long_wait(&self) -> Duration {
        Duration::from_secs(self.long_wait_secs)
    }

    #[must_use]
    pub fn default_wait(&self) -> Duration {
        Duration::from_secs(self.default_wait_secs)
    }
}

impl std::fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchConfig")
            .field("bearer_token", &"[redacted]")
            .field("api_base_url", &self.api_base_url)
            .field("user_agent", &self.user_agent)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("long_wait_secs", &self.long_wait_secs)
            .field("default_wait_secs", &self.default_wait_secs)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}
