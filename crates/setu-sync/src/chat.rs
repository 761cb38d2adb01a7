//! Authenticated messaging view session.
//!
//! Owns the pollers, typing tracker, and presence reporting for the
//! messages page, wiring poll snapshots and acknowledged mutations
//! into the [`ChatStore`] and notifying the host UI through the
//! broadcast channel. Every spawned task hangs off the session's
//! root cancellation token; conversation-scoped tasks hang off a
//! child token that is cancelled whenever the selection changes, so
//! no orphaned timer can outlive its view.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use setu_net::{ApiClient, NetError, NewMessage};
use setu_shared::types::{
    Conversation, ConversationId, Message, MessageId, PresenceStatus, UserId, UserSummary,
};

use crate::config::SyncConfig;
use crate::events::{emit, SyncEvent};
use crate::poller::spawn_poller;
use crate::presence::PresenceReporter;
use crate::store::ChatStore;
use crate::typing::{TypingSignal, TypingTracker};

/// Tasks scoped to the currently open conversation.
struct OpenConversation {
    id: ConversationId,
    cancel: CancellationToken,
    typing: TypingTracker,
}

pub struct ChatSession {
    api: Arc<ApiClient>,
    store: Arc<Mutex<ChatStore>>,
    events: broadcast::Sender<SyncEvent>,
    presence: PresenceReporter,
    cancel: CancellationToken,
    open: Mutex<Option<OpenConversation>>,
    config: SyncConfig,
}

impl ChatSession {
    pub fn new(config: SyncConfig, session_token: impl Into<String>) -> Self {
        let api = Arc::new(ApiClient::with_session(config.base_url.clone(), session_token));
        let (events, _) = broadcast::channel(64);

        Self {
            presence: PresenceReporter::new(api.clone()),
            api,
            store: Arc::new(Mutex::new(ChatStore::new())),
            events,
            cancel: CancellationToken::new(),
            open: Mutex::new(None),
            config,
        }
    }

    /// Subscribe to view update notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Report presence and start the background pollers.
    pub async fn start(&self) {
        self.presence.report(PresenceStatus::Online).await;

        {
            let api = self.api.clone();
            let store = self.store.clone();
            let events = self.events.clone();
            spawn_poller(
                "conversations",
                self.config.unread_poll_period,
                self.cancel.child_token(),
                move || {
                    let api = api.clone();
                    let store = store.clone();
                    let events = events.clone();
                    async move {
                        let conversations = api.conversations().await?;
                        if let Ok(mut guard) = store.lock() {
                            guard.replace_conversations(conversations);
                        }
                        emit(&events, SyncEvent::ConversationsUpdated);
                        Ok(())
                    }
                },
            );
        }

        {
            let api = self.api.clone();
            let store = self.store.clone();
            let events = self.events.clone();
            spawn_poller(
                "unread-count",
                self.config.unread_poll_period,
                self.cancel.child_token(),
                move || {
                    let api = api.clone();
                    let store = store.clone();
                    let events = events.clone();
                    async move {
                        let count = api.unread_count().await?;
                        if let Ok(mut guard) = store.lock() {
                            guard.set_unread(count);
                        }
                        emit(&events, SyncEvent::UnreadCountChanged { count });
                        Ok(())
                    }
                },
            );
        }

        info!("Chat session started");
    }

    /// Open a conversation, replacing any previously open one.
    ///
    /// Spawns the 2s message/typing poller and the typing tracker for
    /// this conversation; the previous conversation's tasks are
    /// cancelled first.
    pub fn open_conversation(&self, conversation: ConversationId) {
        self.close_conversation();

        if let Ok(mut guard) = self.store.lock() {
            guard.select(conversation);
        }

        let cancel = self.cancel.child_token();

        {
            let api = self.api.clone();
            let store = self.store.clone();
            let events = self.events.clone();
            spawn_poller(
                "conversation",
                self.config.message_poll_period,
                cancel.clone(),
                move || {
                    let api = api.clone();
                    let store = store.clone();
                    let events = events.clone();
                    async move {
                        let ticket = match store.lock() {
                            Ok(mut guard) => guard.begin_fetch(),
                            Err(_) => return Ok(()),
                        };

                        let messages = api.messages(conversation).await?;
                        let applied = match store.lock() {
                            Ok(mut guard) => guard.replace_messages(ticket, conversation, messages),
                            Err(_) => false,
                        };
                        if applied {
                            emit(
                                &events,
                                SyncEvent::MessagesUpdated {
                                    conversation_id: conversation,
                                },
                            );
                        }

                        let users = api.typing_users(conversation).await?;
                        let applied = match store.lock() {
                            Ok(mut guard) => guard.replace_typing(conversation, users),
                            Err(_) => false,
                        };
                        if applied {
                            emit(
                                &events,
                                SyncEvent::TypingChanged {
                                    conversation_id: conversation,
                                },
                            );
                        }

                        Ok(())
                    }
                },
            );
        }

        let (typing, mut signal_rx) =
            TypingTracker::spawn(self.config.typing_idle_timeout, cancel.clone());
        {
            let api = self.api.clone();
            tokio::spawn(async move {
                while let Some(signal) = signal_rx.recv().await {
                    let is_typing = matches!(signal, TypingSignal::Started);
                    if let Err(e) = api.set_typing(conversation, is_typing).await {
                        debug!(conversation = %conversation, error = %e, "Typing update failed");
                    }
                }
            });
        }

        if let Ok(mut guard) = self.open.lock() {
            *guard = Some(OpenConversation {
                id: conversation,
                cancel,
                typing,
            });
        }

        debug!(conversation = %conversation, "Conversation opened");
    }

    /// Close the open conversation and cancel its tasks.
    pub fn close_conversation(&self) {
        let previous = match self.open.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(open) = previous {
            open.cancel.cancel();
            debug!(conversation = %open.id, "Conversation closed");
        }
        if let Ok(mut guard) = self.store.lock() {
            guard.clear_selection();
        }
    }

    /// Send a text message.
    ///
    /// On success the server-returned canonical record is appended to
    /// the local list immediately, ahead of the next poll, and the
    /// active typing burst is flushed. On failure nothing was applied;
    /// a failure notice is broadcast and the error returned.
    pub async fn send_message(
        &self,
        conversation: ConversationId,
        content: impl Into<String>,
    ) -> Result<Message, NetError> {
        let body = NewMessage::text(conversation, content);
        let message = match self.api.send_message(&body).await {
            Ok(message) => message,
            Err(e) => {
                emit(
                    &self.events,
                    SyncEvent::Notice {
                        message: "Failed to send message".to_string(),
                    },
                );
                return Err(e);
            }
        };

        if let Ok(guard) = self.open.lock() {
            if let Some(open) = guard.as_ref() {
                if open.id == conversation {
                    open.typing.stop_now();
                }
            }
        }

        let applied = match self.store.lock() {
            Ok(mut guard) => {
                let ticket = guard.begin_fetch();
                guard.append_own_message(ticket, message.clone())
            }
            Err(_) => false,
        };
        if applied {
            emit(
                &self.events,
                SyncEvent::MessagesUpdated {
                    conversation_id: conversation,
                },
            );
        }

        info!(message = %message.id, conversation = %conversation, "Message sent");
        Ok(message)
    }

    /// React to a message, then refresh the list once so the reaction
    /// shows without waiting for the next poll tick.
    pub async fn react_to_message(
        &self,
        conversation: ConversationId,
        message: MessageId,
        reaction: &str,
    ) -> Result<(), NetError> {
        if let Err(e) = self.api.react_to_message(message, reaction).await {
            emit(
                &self.events,
                SyncEvent::Notice {
                    message: "Failed to add reaction".to_string(),
                },
            );
            return Err(e);
        }
        self.refresh_messages(conversation).await
    }

    /// Start a direct conversation and prepend it to the list.
    pub async fn create_conversation(
        &self,
        participants: &[UserId],
    ) -> Result<Conversation, NetError> {
        let conversation = match self.api.create_conversation(participants).await {
            Ok(conversation) => conversation,
            Err(e) => {
                emit(
                    &self.events,
                    SyncEvent::Notice {
                        message: "Failed to create conversation".to_string(),
                    },
                );
                return Err(e);
            }
        };

        if let Ok(mut guard) = self.store.lock() {
            guard.insert_conversation(conversation.clone());
        }
        emit(&self.events, SyncEvent::ConversationsUpdated);
        Ok(conversation)
    }

    /// Record one keystroke in the open conversation's composer.
    pub fn record_typing_input(&self) {
        if let Ok(guard) = self.open.lock() {
            if let Some(open) = guard.as_ref() {
                open.typing.record_input();
            }
        }
    }

    /// Best-effort offline report, then cancel every task.
    pub async fn shutdown(&self) {
        self.presence.report(PresenceStatus::Offline).await;
        self.close_conversation();
        self.cancel.cancel();
        info!("Chat session stopped");
    }

    async fn refresh_messages(&self, conversation: ConversationId) -> Result<(), NetError> {
        let ticket = match self.store.lock() {
            Ok(mut guard) => guard.begin_fetch(),
            Err(_) => return Ok(()),
        };
        let messages = self.api.messages(conversation).await?;
        let applied = match self.store.lock() {
            Ok(mut guard) => guard.replace_messages(ticket, conversation, messages),
            Err(_) => false,
        };
        if applied {
            emit(
                &self.events,
                SyncEvent::MessagesUpdated {
                    conversation_id: conversation,
                },
            );
        }
        Ok(())
    }

    // -- View accessors (cloned snapshots for rendering) --

    pub fn conversations(&self) -> Vec<Conversation> {
        self.store
            .lock()
            .map(|guard| guard.conversations().to_vec())
            .unwrap_or_default()
    }

    pub fn selected_conversation(&self) -> Option<ConversationId> {
        self.store.lock().ok().and_then(|guard| guard.selected())
    }

    pub fn messages(&self) -> Vec<Message> {
        self.store
            .lock()
            .map(|guard| guard.messages().to_vec())
            .unwrap_or_default()
    }

    pub fn typing_users(&self) -> Vec<UserSummary> {
        self.store
            .lock()
            .map(|guard| guard.typing_users().to_vec())
            .unwrap_or_default()
    }

    pub fn unread_count(&self) -> u64 {
        self.store
            .lock()
            .map(|guard| guard.unread_count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use uuid::Uuid;

    // No backend listens here; calls fail fast with a transport error.
    fn unreachable_session() -> ChatSession {
        let config = SyncConfig::new("http://127.0.0.1:1", "ws://127.0.0.1:1");
        ChatSession::new(config, "test-token")
    }

    #[tokio::test]
    async fn open_and_close_track_the_selection() {
        let session = unreachable_session();
        let conversation = ConversationId(Uuid::new_v4());

        session.open_conversation(conversation);
        assert_eq!(session.selected_conversation(), Some(conversation));

        session.close_conversation();
        assert_eq!(session.selected_conversation(), None);
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn reopening_replaces_the_selection() {
        let session = unreachable_session();
        let first = ConversationId(Uuid::new_v4());
        let second = ConversationId(Uuid::new_v4());

        session.open_conversation(first);
        session.open_conversation(second);

        assert_eq!(session.selected_conversation(), Some(second));
    }

    #[tokio::test]
    async fn failed_send_emits_a_notice_and_no_state_change() {
        let session = unreachable_session();
        let conversation = ConversationId(Uuid::new_v4());
        session.open_conversation(conversation);

        let mut events = session.subscribe();
        let result = session.send_message(conversation, "hello").await;

        assert!(result.is_err());
        assert!(session.messages().is_empty());

        // The notice must arrive even if poller events interleave.
        loop {
            match events.recv().await.expect("event stream closed") {
                SyncEvent::Notice { message } => {
                    assert_eq!(message, "Failed to send message");
                    break;
                }
                _ => continue,
            }
        }
    }

    #[tokio::test]
    async fn typing_input_without_an_open_conversation_is_ignored() {
        let session = unreachable_session();
        // Must not panic or emit anything.
        session.record_typing_input();
    }
}
