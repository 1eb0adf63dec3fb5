pub mod client;
pub mod parse;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use client::YouTubeChat;

/// Kind of live chat item, named the way YouTube's event types are usually labelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    TextMessage,
    SuperChat,
    SuperSticker,
    NewSponsor,
    ViewerEngagementMessage,
}

impl EventKind {
    /// Paid messages, stickers and new memberships
    pub fn is_paid(self) -> bool {
        matches!(
            self,
            EventKind::SuperChat | EventKind::SuperSticker | EventKind::NewSponsor
        )
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::TextMessage => write!(f, "textMessage"),
            EventKind::SuperChat => write!(f, "superChat"),
            EventKind::SuperSticker => write!(f, "superSticker"),
            EventKind::NewSponsor => write!(f, "newSponsor"),
            EventKind::ViewerEngagementMessage => write!(f, "viewerEngagementMessage"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Author {
    pub name: String,
    pub channel_id: String,
    pub is_verified: bool,
    pub is_chat_owner: bool,
    pub is_chat_sponsor: bool,
    pub is_chat_moderator: bool,
}

impl Author {
    /// Badge glyphs shown after the name in log lines
    pub fn badges(&self) -> String {
        let mut badges = String::new();
        if self.is_verified {
            badges.push('✔');
        }
        if self.is_chat_owner {
            badges.push('👑');
        }
        if self.is_chat_sponsor {
            badges.push('💎');
        }
        if self.is_chat_moderator {
            badges.push('🔧');
        }
        badges
    }
}

/// A single live chat event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatEvent {
    pub kind: EventKind,
    pub id: String,
    pub author: Author,
    /// Message text with emoji rendered as their `:shortcut:`
    pub text: String,
    /// Purchase amount as displayed, e.g. "¥1,000"
    pub amount: Option<String>,
    /// Numeric part of `amount`
    pub amount_value: Option<f64>,
    /// ISO currency code, e.g. "JPY"
    pub currency: Option<String>,
    /// Paid message header colour as ARGB
    pub bg_color: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paid_kinds() {
        assert!(EventKind::SuperChat.is_paid());
        assert!(EventKind::SuperSticker.is_paid());
        assert!(EventKind::NewSponsor.is_paid());
        assert!(!EventKind::TextMessage.is_paid());
        assert!(!EventKind::ViewerEngagementMessage.is_paid());
    }

    #[test]
    fn test_kind_display_matches_serde() {
        for kind in [
            EventKind::TextMessage,
            EventKind::SuperChat,
            EventKind::SuperSticker,
            EventKind::NewSponsor,
            EventKind::ViewerEngagementMessage,
        ] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json.as_str(), Some(kind.to_string().as_str()));
        }
    }

    #[test]
    fn test_badges() {
        let author = Author {
            name: "owner".to_string(),
            is_chat_owner: true,
            is_chat_moderator: true,
            ..Default::default()
        };
        assert_eq!(author.badges(), "👑🔧");
        assert_eq!(Author::default().badges(), "");
    }

    #[test]
    fn test_payload_carries_purchase_details() {
        let event = ChatEvent {
            kind: EventKind::SuperChat,
            id: "p1".to_string(),
            author: Author::default(),
            text: "GG".to_string(),
            amount: Some("¥1,000".to_string()),
            amount_value: Some(1000.0),
            currency: Some("JPY".to_string()),
            bg_color: Some(0xFFE6_2117),
            timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "superChat");
        assert_eq!(json["currency"], "JPY");
        assert_eq!(json["amount_value"], 1000.0);
        assert_eq!(json["bg_color"], 0xFFE6_2117u32);
    }
}
