use std::fmt;

use serde::{Deserialize, Serialize};

/// Display label attached to count events.
pub const COUNT_EVENT_TITLE: &str = "Microsoft Teams";
/// Display label attached to presence events.
pub const PRESENCE_EVENT_TITLE: &str = "Teams Status";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    NewMessage,
    MessageRead,
    StatusAway,
}

/// One edge observed on the page, serialized as the sink's JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_count: Option<i64>,
    #[serde(rename = "title")]
    pub label: String,
    pub message: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Presence label inferred from the page. `Unknown` means no heuristic matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceLabel {
    Available,
    Away,
    Busy,
    Dnd,
    #[default]
    Unknown,
}

impl PresenceLabel {
    /// Case-insensitive substring inference. Earlier groups win when text
    /// mentions several states.
    pub fn infer(text: &str) -> Self {
        let text = text.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|needle| text.contains(needle));

        if has(&["available", "online"]) {
            PresenceLabel::Available
        } else if has(&["away", "offline"]) {
            PresenceLabel::Away
        } else if has(&["busy", "in a call", "in a meeting"]) {
            PresenceLabel::Busy
        } else if has(&["do not disturb", "dnd"]) {
            PresenceLabel::Dnd
        } else {
            PresenceLabel::Unknown
        }
    }

    pub fn is_confident(self) -> bool {
        self != PresenceLabel::Unknown
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PresenceLabel::Available => "available",
            PresenceLabel::Away => "away",
            PresenceLabel::Busy => "busy",
            PresenceLabel::Dnd => "dnd",
            PresenceLabel::Unknown => "unknown",
        }
    }

    /// Label with its first letter upper-cased, as shown in alert messages.
    pub fn display_name(self) -> String {
        let raw = self.as_str();
        let mut chars = raw.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for PresenceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn unread_message_text(count: u32) -> String {
    match count {
        0 => "No unread messages".to_string(),
        1 => "1 unread message".to_string(),
        n => format!("{n} unread messages"),
    }
}

pub fn presence_message_text(label: PresenceLabel) -> String {
    format!("You are now appearing as {}", label.display_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_is_case_insensitive_and_ordered() {
        assert_eq!(PresenceLabel::infer("Status: AVAILABLE"), PresenceLabel::Available);
        assert_eq!(PresenceLabel::infer("Appear offline"), PresenceLabel::Away);
        assert_eq!(PresenceLabel::infer("In a meeting"), PresenceLabel::Busy);
        assert_eq!(PresenceLabel::infer("Do not disturb"), PresenceLabel::Dnd);
        assert_eq!(PresenceLabel::infer("Jane Doe"), PresenceLabel::Unknown);
        // "online" outranks "busy" when both appear.
        assert_eq!(PresenceLabel::infer("busy, online"), PresenceLabel::Available);
    }

    #[test]
    fn display_name_capitalizes() {
        assert_eq!(PresenceLabel::Dnd.display_name(), "Dnd");
        assert_eq!(PresenceLabel::Away.display_name(), "Away");
    }

    #[test]
    fn unread_text_pluralizes() {
        assert_eq!(unread_message_text(0), "No unread messages");
        assert_eq!(unread_message_text(1), "1 unread message");
        assert_eq!(unread_message_text(7), "7 unread messages");
    }
}
