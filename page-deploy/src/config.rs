//! Deploy client configuration.

use std::time::Duration;

use pagecraft_core::PollPolicy;

/// Limits applied to every deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployConfig {
    /// Upper bound for any single provider call.
    pub request_timeout: Duration,
    /// Uploads allowed in flight at once.
    pub upload_concurrency: usize,
    /// Status polling limits.
    pub poll: PollPolicy,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            upload_concurrency: 4,
            poll: PollPolicy::default(),
        }
    }
}

impl DeployConfig {
    /// Set the per-call timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the upload concurrency (at least 1).
    pub fn with_upload_concurrency(mut self, concurrency: usize) -> Self {
        self.upload_concurrency = concurrency.max(1);
        self
    }

    /// Set the delay between status polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll.interval = interval;
        self
    }

    /// Set how many status polls to make before giving up (at least 1).
    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.poll.max_polls = max_polls.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_clamp_to_one() {
        let config = DeployConfig::default()
            .with_upload_concurrency(0)
            .with_max_polls(0)
            .with_poll_interval(Duration::from_millis(5));
        assert_eq!(config.upload_concurrency, 1);
        assert_eq!(config.poll.max_polls, 1);
        assert_eq!(config.poll.interval, Duration::from_millis(5));
    }
}
