use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ConversationId(pub Uuid);

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MessageId(pub Uuid);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user's last-reported presence, as the backend knows it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Away,
    Offline,
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Online => "online",
            Self::Away => "away",
            Self::Offline => "offline",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresenceSnapshot {
    pub status: PresenceStatus,
    pub last_seen: DateTime<Utc>,
}

/// Participant summary embedded in conversation and typing payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub presence: Option<PresenceSnapshot>,
}

/// A thread between two or more participants.
///
/// Fetched on view mount, refreshed every poll tick, and replaced
/// wholesale on each fetch; individual fields are never merged
/// client-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub id: ConversationId,
    pub other_user: UserSummary,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub unread_count: u32,
    pub updated_at: DateTime<Utc>,
}

/// An emoji reaction attached to a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reaction {
    pub user_id: UserId,
    pub reaction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
    #[serde(default = "default_message_type")]
    pub message_type: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read_by: Vec<UserId>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub reply_to_id: Option<MessageId>,
}

fn default_message_type() -> String {
    "text".to_string()
}

/// A named live counter on the guest impact dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Counter {
    pub value: f64,
    /// Counter category ("impact", "donation", ...).
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub last_updated: DateTime<Utc>,
}

/// One entry of the guest-facing donation ticker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Donation {
    pub id: Uuid,
    pub donor_name: String,
    pub ngo_name: String,
    pub amount: f64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// One entry of the guest-facing impact timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImpactEvent {
    pub id: Uuid,
    pub event_type: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub impact_value: Option<f64>,
    #[serde(default)]
    pub impact_unit: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&PresenceStatus::Online).unwrap(),
            "\"online\""
        );
        let parsed: PresenceStatus = serde_json::from_str("\"away\"").unwrap();
        assert_eq!(parsed, PresenceStatus::Away);
    }

    #[test]
    fn message_defaults_for_optional_fields() {
        let json = format!(
            r#"{{
                "id": "{}",
                "conversation_id": "{}",
                "sender_id": "{}",
                "content": "hello",
                "created_at": "2026-08-01T10:00:00Z"
            }}"#,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
        );

        let msg: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg.content, "hello");
        assert_eq!(msg.message_type, "text");
        assert!(msg.read_by.is_empty());
        assert!(msg.reactions.is_empty());
        assert!(msg.reply_to_id.is_none());
    }

    #[test]
    fn counter_kind_uses_type_on_the_wire() {
        let json = r#"{"value": 42.0, "type": "impact", "last_updated": "2026-08-01T10:00:00Z"}"#;
        let counter: Counter = serde_json::from_str(json).unwrap();
        assert_eq!(counter.kind.as_deref(), Some("impact"));
        assert_eq!(counter.value, 42.0);
    }
}
