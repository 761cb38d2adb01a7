//! Session configuration.
//!
//! All tunables default to the values the backend was designed
//! around, so a host only has to supply the two endpoints.

use std::time::Duration;

use setu_net::ReconnectConfig;
use setu_shared::constants::{
    FEED_CAP, MESSAGE_POLL_PERIOD, TYPING_IDLE_TIMEOUT, UNREAD_POLL_PERIOD,
};

/// Configuration shared by the chat and dashboard sessions.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Backend origin for REST calls, without a trailing slash.
    /// e.g. `https://setu.example.org`
    pub base_url: String,

    /// Backend origin for the push channel.
    /// e.g. `wss://setu.example.org`
    pub ws_url: String,

    /// Poll period for the open conversation's messages and typing
    /// users. Default: 2s.
    pub message_poll_period: Duration,

    /// Poll period for the conversation list and the unread counter.
    /// Default: 30s.
    pub unread_poll_period: Duration,

    /// Input inactivity after which a stopped-typing signal is sent.
    /// Default: 1s.
    pub typing_idle_timeout: Duration,

    /// Maximum entries kept in the donation ticker and timeline.
    /// Default: 20.
    pub feed_cap: usize,

    /// Push-channel reconnection backoff.
    pub reconnect: ReconnectConfig,
}

impl SyncConfig {
    pub fn new(base_url: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ws_url: ws_url.into(),
            message_poll_period: MESSAGE_POLL_PERIOD,
            unread_poll_period: UNREAD_POLL_PERIOD,
            typing_idle_timeout: TYPING_IDLE_TIMEOUT,
            feed_cap: FEED_CAP,
            reconnect: ReconnectConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_backend_expectations() {
        let config = SyncConfig::new("https://setu.example.org", "wss://setu.example.org");
        assert_eq!(config.message_poll_period, Duration::from_secs(2));
        assert_eq!(config.unread_poll_period, Duration::from_secs(30));
        assert_eq!(config.typing_idle_timeout, Duration::from_secs(1));
        assert_eq!(config.feed_cap, 20);
    }
}
