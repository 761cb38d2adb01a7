//! Update notifications published to the hosting UI.
//!
//! Sessions never touch rendering; they broadcast a [`SyncEvent`]
//! whenever a view slice changed and the host re-reads the store
//! through the session's accessors.

use tokio::sync::broadcast;

use setu_shared::types::ConversationId;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// The conversation list was replaced from a fetch.
    ConversationsUpdated,

    /// The open conversation's message list changed.
    MessagesUpdated { conversation_id: ConversationId },

    /// The set of remote users typing in the open conversation changed.
    TypingChanged { conversation_id: ConversationId },

    /// The unread notification counter changed.
    UnreadCountChanged { count: u64 },

    /// One or more dashboard counters changed.
    CountersUpdated,

    /// The donation ticker or impact timeline changed.
    FeedUpdated,

    /// The push channel went up or down.
    PushChannel { connected: bool },

    /// A user-facing failure notice (toast equivalent).
    Notice { message: String },
}

/// Broadcast an event, tolerating the absence of subscribers.
pub(crate) fn emit(tx: &broadcast::Sender<SyncEvent>, event: SyncEvent) {
    if tx.send(event).is_err() {
        tracing::trace!("No subscribers for sync event");
    }
}
