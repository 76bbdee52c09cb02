//! Configuration for the streaming client.
//!
//! This module provides the [`Config`] struct carrying the server address and
//! the timing policy for keepalive and reconnection.

use std::time::Duration;

/// Default delay between reconnection attempts
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Default interval between keepalive pings while connected
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for the streaming client
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use trading_stream::Config;
///
/// let config = Config::new("wss://stream.example.com/ws")
///     .with_reconnect_delay(Duration::from_secs(2))
///     .with_keepalive_interval(Duration::from_secs(15));
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// WebSocket server address
    url: String,

    /// Fixed delay before each reconnection attempt
    reconnect_delay: Duration,

    /// Interval between keepalive pings while connected
    keepalive_interval: Duration,
}

impl Config {
    /// Create a new configuration for the given server address
    ///
    /// The address is not validated here; a malformed address fails the
    /// `connect` call instead.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
        }
    }

    /// Set the fixed delay between reconnection attempts
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the keepalive ping interval
    #[must_use]
    pub fn with_keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Get the server address
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the reconnect delay
    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    /// Get the keepalive interval
    pub fn keepalive_interval(&self) -> Duration {
        self.keepalive_interval
    }
}
