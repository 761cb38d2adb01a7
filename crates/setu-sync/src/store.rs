//! Typed view stores with explicit reducer functions.
//!
//! Every merge of poll results, push events, and acknowledged
//! mutations goes through a named reducer here, so the merge
//! semantics are auditable and testable in isolation from rendering.
//!
//! Concurrent responses are ordered with a monotonic fetch ticket:
//! pollers take a ticket when a request is initiated and a snapshot
//! only applies when its ticket is newer than the last one applied.
//! An optimistic append takes its ticket at response arrival, so a
//! poll snapshot that predates the acknowledgment can never clobber
//! the appended message.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use setu_shared::types::{
    Conversation, ConversationId, Counter, Donation, ImpactEvent, Message, UserSummary,
};

/// View state for the authenticated messaging page.
#[derive(Debug, Default)]
pub struct ChatStore {
    conversations: Vec<Conversation>,
    selected: Option<ConversationId>,
    messages: Vec<Message>,
    typing_users: Vec<UserSummary>,
    unread_count: u64,
    next_ticket: u64,
    messages_ticket: u64,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a ticket for a request about to be issued (pollers) or
    /// just acknowledged (optimistic appends).
    pub fn begin_fetch(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    /// Select a conversation, clearing the per-conversation slices.
    pub fn select(&mut self, conversation: ConversationId) {
        self.selected = Some(conversation);
        self.messages.clear();
        self.typing_users.clear();
        self.messages_ticket = 0;
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.messages.clear();
        self.typing_users.clear();
        self.messages_ticket = 0;
    }

    /// Replace the conversation list wholesale from a fetch.
    pub fn replace_conversations(&mut self, conversations: Vec<Conversation>) {
        self.conversations = conversations;
    }

    /// Prepend a newly created conversation, replacing any stale copy.
    pub fn insert_conversation(&mut self, conversation: Conversation) {
        self.conversations.retain(|c| c.id != conversation.id);
        self.conversations.insert(0, conversation);
    }

    /// Replace the message list from a poll snapshot.
    ///
    /// Rejected (returns false) when the snapshot belongs to a
    /// conversation that is no longer selected, or when a newer
    /// response has already been applied.
    pub fn replace_messages(
        &mut self,
        ticket: u64,
        conversation: ConversationId,
        messages: Vec<Message>,
    ) -> bool {
        if self.selected != Some(conversation) || ticket <= self.messages_ticket {
            return false;
        }
        self.messages = messages;
        self.messages_ticket = ticket;
        true
    }

    /// Append the canonical message returned by a successful POST.
    ///
    /// De-duplicates by id; a copy already delivered by a poll
    /// snapshot is left in place. Advances the ticket so that any
    /// in-flight snapshot predating the acknowledgment is rejected.
    pub fn append_own_message(&mut self, ticket: u64, message: Message) -> bool {
        if self.selected != Some(message.conversation_id) {
            return false;
        }
        self.messages_ticket = self.messages_ticket.max(ticket);
        if self.messages.iter().any(|m| m.id == message.id) {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Replace the remote typing-user set from a poll snapshot.
    pub fn replace_typing(&mut self, conversation: ConversationId, users: Vec<UserSummary>) -> bool {
        if self.selected != Some(conversation) {
            return false;
        }
        self.typing_users = users;
        true
    }

    pub fn set_unread(&mut self, count: u64) {
        self.unread_count = count;
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn selected(&self) -> Option<ConversationId> {
        self.selected
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn typing_users(&self) -> &[UserSummary] {
        &self.typing_users
    }

    pub fn unread_count(&self) -> u64 {
        self.unread_count
    }
}

/// View state for the guest live dashboard.
///
/// Feeds are newest-first and bounded; the backend re-sends the full
/// snapshot on every fetch, so a wholesale replace self-heals any
/// drift the push channel introduced.
#[derive(Debug)]
pub struct DashboardStore {
    counters: HashMap<String, Counter>,
    donations: Vec<Donation>,
    timeline: Vec<ImpactEvent>,
    feed_cap: usize,
}

impl DashboardStore {
    pub fn new(feed_cap: usize) -> Self {
        Self {
            counters: HashMap::new(),
            donations: Vec::new(),
            timeline: Vec::new(),
            feed_cap,
        }
    }

    pub fn replace_counters(&mut self, counters: HashMap<String, Counter>) {
        self.counters = counters;
    }

    /// Keyed replace of one counter from a push event.
    ///
    /// Rejected when the stored value carries a newer timestamp, so a
    /// delayed push can never roll a counter backwards in time. The
    /// counter's category is preserved across updates; counters first
    /// seen via push default to the "impact" category.
    pub fn apply_counter_update(
        &mut self,
        name: &str,
        value: f64,
        at: DateTime<Utc>,
    ) -> bool {
        let kind = match self.counters.get(name) {
            Some(existing) if existing.last_updated > at => return false,
            Some(existing) => existing.kind.clone(),
            None => None,
        }
        .unwrap_or_else(|| "impact".to_string());
        self.counters.insert(
            name.to_string(),
            Counter {
                value,
                kind: Some(kind),
                last_updated: at,
            },
        );
        true
    }

    pub fn replace_donations(&mut self, mut donations: Vec<Donation>) {
        donations.truncate(self.feed_cap);
        self.donations = donations;
    }

    /// Prepend a pushed donation, newest first.
    ///
    /// De-duplicates by id against the current list and truncates to
    /// the cap.
    pub fn push_donation(&mut self, donation: Donation) -> bool {
        if self.donations.iter().any(|d| d.id == donation.id) {
            return false;
        }
        self.donations.insert(0, donation);
        self.donations.truncate(self.feed_cap);
        true
    }

    pub fn replace_timeline(&mut self, mut events: Vec<ImpactEvent>) {
        events.truncate(self.feed_cap);
        self.timeline = events;
    }

    pub fn push_timeline_event(&mut self, event: ImpactEvent) -> bool {
        if self.timeline.iter().any(|e| e.id == event.id) {
            return false;
        }
        self.timeline.insert(0, event);
        self.timeline.truncate(self.feed_cap);
        true
    }

    pub fn counters(&self) -> &HashMap<String, Counter> {
        &self.counters
    }

    pub fn donations(&self) -> &[Donation] {
        &self.donations
    }

    pub fn timeline(&self) -> &[ImpactEvent] {
        &self.timeline
    }
}
