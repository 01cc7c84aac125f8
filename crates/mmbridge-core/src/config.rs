// ── Runtime coordinator configuration ──
//
// Describes *which* mirror to talk to and how often. Carries the API key
// but never touches disk: the CLI (or any other host) builds a
// `CoordinatorConfig` and hands it in.

use std::time::Duration;

use mmbridge_api::{Connection, TransportConfig};

/// Default polling cadence.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(60);
/// Default deadline for one whole refresh cycle.
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(20);
/// Default per-request ceiling when the coordinator builds its own session.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for coordinating a single mirror.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub connection: Connection,
    /// Time between periodic refreshes. Zero disables the timer.
    pub update_interval: Duration,
    /// Deadline covering every request of one refresh cycle.
    pub refresh_timeout: Duration,
    /// Ceiling for a single request. Never applied below `refresh_timeout`,
    /// so a hung read always trips the cycle deadline.
    pub request_timeout: Duration,
}

impl CoordinatorConfig {
    pub fn new(connection: Connection) -> Self {
        Self {
            connection,
            update_interval: DEFAULT_UPDATE_INTERVAL,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Transport settings for a coordinator-owned session.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig::default().with_timeout(self.effective_request_timeout())
    }

    /// The per-request timeout actually handed to the HTTP session.
    pub fn effective_request_timeout(&self) -> Duration {
        self.request_timeout.max(self.refresh_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config() -> CoordinatorConfig {
        CoordinatorConfig::new(Connection::new(
            "10.0.0.5",
            8080,
            SecretString::from("key".to_string()),
        ))
    }

    #[test]
    fn default_request_timeout_outlasts_cycle_deadline() {
        let config = config();
        assert!(config.effective_request_timeout() >= config.refresh_timeout);
    }

    #[test]
    fn short_request_timeout_is_raised_to_cycle_deadline() {
        let config = config()
            .with_request_timeout(Duration::from_millis(200))
            .with_refresh_timeout(Duration::from_millis(400));
        assert_eq!(
            config.effective_request_timeout(),
            Duration::from_millis(400)
        );
    }

    #[test]
    fn longer_request_timeout_is_kept() {
        let config = config().with_request_timeout(Duration::from_secs(45));
        assert_eq!(config.effective_request_timeout(), Duration::from_secs(45));
    }
}
