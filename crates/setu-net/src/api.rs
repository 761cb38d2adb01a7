//! Typed REST client for the Seva-Setu backend.
//!
//! One method per endpoint the sync layer relies on. Authenticated
//! calls forward the session token as a cookie; guest dashboard calls
//! carry none. The backend is the source of truth: every GET returns
//! a full snapshot that replaces the corresponding view slice.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use setu_shared::types::{
    Conversation, ConversationId, Counter, Donation, ImpactEvent, Message, MessageId,
    PresenceStatus, UserId, UserSummary,
};

use crate::error::{NetError, Result};

/// Body for `POST /api/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub content: String,
    pub message_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<MessageId>,
}

impl NewMessage {
    pub fn text(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self {
            conversation_id,
            content: content.into(),
            message_type: "text".to_string(),
            reply_to_id: None,
        }
    }
}

// Response envelopes. The backend wraps every payload in a named field.

#[derive(Debug, Deserialize)]
struct ConversationsResponse {
    conversations: Vec<Conversation>,
}

#[derive(Debug, Deserialize)]
struct ConversationResponse {
    conversation: Conversation,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct TypingUsersResponse {
    typing_users: Vec<UserSummary>,
}

#[derive(Debug, Deserialize)]
struct UnreadCountResponse {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct CountersResponse {
    #[serde(default)]
    counters: HashMap<String, Counter>,
}

#[derive(Debug, Deserialize)]
struct DonationsResponse {
    #[serde(default)]
    donations: Vec<Donation>,
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    timeline_events: Vec<ImpactEvent>,
}

/// HTTP client for the backend REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session_token: Option<String>,
}

impl ApiClient {
    /// Create a client for a guest (unauthenticated) session.
    ///
    /// `base_url` is the backend origin without a trailing slash,
    /// e.g. `https://setu.example.org`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            session_token: None,
        }
    }

    /// Create a client that authenticates with a session token cookie.
    pub fn with_session(base_url: impl Into<String>, session_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            session_token: Some(session_token.into()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.with_auth(self.http.get(self.url(path)))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.with_auth(self.http.post(self.url(path)))
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.session_token {
            Some(token) => req.header(reqwest::header::COOKIE, format!("session_token={token}")),
            None => req,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match status.as_u16() {
            401 | 403 => Err(NetError::AuthRequired),
            code => Err(NetError::Status(code)),
        }
    }

    // -- Conversations & messages --

    pub async fn conversations(&self) -> Result<Vec<Conversation>> {
        let response = Self::check(self.get("/conversations").send().await?).await?;
        let body: ConversationsResponse = response.json().await?;
        Ok(body.conversations)
    }

    /// Start a direct conversation with the given participants.
    pub async fn create_conversation(&self, participant_ids: &[UserId]) -> Result<Conversation> {
        let response = Self::check(
            self.post("/conversations")
                .json(&serde_json::json!({
                    "participant_ids": participant_ids,
                    "type": "direct",
                }))
                .send()
                .await?,
        )
        .await?;
        let body: ConversationResponse = response.json().await?;
        Ok(body.conversation)
    }

    pub async fn messages(&self, conversation: ConversationId) -> Result<Vec<Message>> {
        let response = Self::check(
            self.get(&format!("/conversations/{conversation}/messages"))
                .send()
                .await?,
        )
        .await?;
        let body: MessagesResponse = response.json().await?;
        Ok(body.messages)
    }

    /// Send a message; returns the canonical server-side record.
    pub async fn send_message(&self, message: &NewMessage) -> Result<Message> {
        let response =
            Self::check(self.post("/messages").json(message).send().await?).await?;
        let body: MessageResponse = response.json().await?;
        Ok(body.message)
    }

    pub async fn react_to_message(&self, message: MessageId, reaction: &str) -> Result<()> {
        Self::check(
            self.post(&format!("/messages/{message}/react"))
                .json(&serde_json::json!({ "reaction": reaction }))
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    // -- Typing & presence --

    pub async fn typing_users(&self, conversation: ConversationId) -> Result<Vec<UserSummary>> {
        let response = Self::check(
            self.get(&format!("/conversations/{conversation}/typing"))
                .send()
                .await?,
        )
        .await?;
        let body: TypingUsersResponse = response.json().await?;
        Ok(body.typing_users)
    }

    pub async fn set_typing(&self, conversation: ConversationId, is_typing: bool) -> Result<()> {
        Self::check(
            self.post(&format!("/conversations/{conversation}/typing"))
                .json(&serde_json::json!({
                    "conversation_id": conversation,
                    "is_typing": is_typing,
                }))
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    pub async fn update_presence(&self, status: PresenceStatus) -> Result<()> {
        Self::check(
            self.post("/presence")
                .json(&serde_json::json!({ "status": status }))
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    // -- Notifications --

    pub async fn unread_count(&self) -> Result<u64> {
        let response = Self::check(self.get("/notifications/unread-count").send().await?).await?;
        let body: UnreadCountResponse = response.json().await?;
        Ok(body.count)
    }

    // -- Guest dashboard --

    pub async fn counters(&self) -> Result<HashMap<String, Counter>> {
        let response = Self::check(self.get("/realtime/counters").send().await?).await?;
        let body: CountersResponse = response.json().await?;
        Ok(body.counters)
    }

    pub async fn donation_ticker(&self, limit: usize) -> Result<Vec<Donation>> {
        let response = Self::check(
            self.get("/realtime/donation-ticker")
                .query(&[("limit", limit)])
                .send()
                .await?,
        )
        .await?;
        let body: DonationsResponse = response.json().await?;
        Ok(body.donations)
    }

    pub async fn timeline(&self, limit: usize) -> Result<Vec<ImpactEvent>> {
        let response = Self::check(
            self.get("/realtime/timeline")
                .query(&[("limit", limit)])
                .send()
                .await?,
        )
        .await?;
        let body: TimelineResponse = response.json().await?;
        Ok(body.timeline_events)
    }
}
