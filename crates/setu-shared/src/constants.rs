use std::time::Duration;

/// Poll period for messages and typing users in the open conversation.
pub const MESSAGE_POLL_PERIOD: Duration = Duration::from_secs(2);

/// Poll period for the conversation list and the unread counter.
pub const UNREAD_POLL_PERIOD: Duration = Duration::from_secs(30);

/// Typing indicator expires after this much input inactivity.
pub const TYPING_IDLE_TIMEOUT: Duration = Duration::from_secs(1);

/// Maximum entries kept in the donation ticker and impact timeline.
pub const FEED_CAP: usize = 20;

/// Delay before the first push-channel reconnection attempt.
pub const RECONNECT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on the push-channel reconnection delay.
pub const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(30);
