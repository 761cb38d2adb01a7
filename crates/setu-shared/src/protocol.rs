//! Push-event envelopes delivered on the WebSocket channel.
//!
//! Every frame is a JSON object tagged with a `type` field. Types the
//! client does not recognise are ignored so the backend can introduce
//! new events without breaking deployed clients.

use serde::Deserialize;

use crate::types::{ConversationId, Donation, ImpactEvent, UserId};

/// All push events the client understands.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    /// A named dashboard counter changed value.
    CounterUpdate { counter_name: String, value: f64 },

    /// A donation completed and should enter the ticker.
    NewDonation { donation: Donation },

    /// An impact event was published for the timeline.
    NewImpactEvent { event: ImpactEvent },

    /// Another participant started or stopped typing.
    Typing {
        conversation_id: ConversationId,
        user_id: UserId,
        is_typing: bool,
    },

    /// Keepalive acknowledgment.
    Pong,
}

impl PushEvent {
    /// Parse one text frame.
    ///
    /// Returns `Ok(None)` for a well-formed envelope with an unknown
    /// `type`, and `Err` only for malformed JSON or a known type with
    /// a bad payload.
    pub fn parse(text: &str) -> Result<Option<Self>, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(text)?;

        let known = matches!(
            value.get("type").and_then(|t| t.as_str()),
            Some("counter_update" | "new_donation" | "new_impact_event" | "typing" | "pong")
        );
        if !known {
            return Ok(None);
        }

        serde_json::from_value(value).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_counter_update() {
        let event = PushEvent::parse(r#"{"type": "counter_update", "counter_name": "trees_planted", "value": 1200}"#)
            .unwrap()
            .unwrap();

        assert_eq!(
            event,
            PushEvent::CounterUpdate {
                counter_name: "trees_planted".to_string(),
                value: 1200.0,
            }
        );
    }

    #[test]
    fn parses_new_donation() {
        let json = r#"{
            "type": "new_donation",
            "donation": {
                "id": "6dc85fa1-1a2b-4c3d-8e9f-0a1b2c3d4e5f",
                "donor_name": "Asha",
                "ngo_name": "Clean Rivers",
                "amount": 50.0,
                "currency": "USD",
                "created_at": "2026-08-01T10:00:00Z"
            }
        }"#;

        match PushEvent::parse(json).unwrap().unwrap() {
            PushEvent::NewDonation { donation } => {
                assert_eq!(donation.donor_name, "Asha");
                assert_eq!(donation.amount, 50.0);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn unknown_type_is_ignored() {
        let parsed = PushEvent::parse(r#"{"type": "heatmap_update", "cells": []}"#).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(PushEvent::parse("{not json").is_err());
    }

    #[test]
    fn known_type_with_bad_payload_is_an_error() {
        assert!(PushEvent::parse(r#"{"type": "counter_update"}"#).is_err());
    }
}
