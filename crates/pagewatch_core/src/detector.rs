//! Edge detection over sampled signal values.

use crate::event::{
    presence_message_text, unread_message_text, ChangeEvent, EventKind, PresenceLabel,
    COUNT_EVENT_TITLE, PRESENCE_EVENT_TITLE,
};

/// Sentinel for "nothing sampled yet"; guarantees the first sample fires.
pub const INITIAL_COUNT: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountDetector {
    last: i64,
}

impl Default for CountDetector {
    fn default() -> Self {
        Self {
            last: INITIAL_COUNT,
        }
    }
}

impl CountDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> i64 {
        self.last
    }

    /// Records `count` and returns an event when it differs from the previous sample.
    pub fn observe(&mut self, count: u32, timestamp: i64) -> Option<ChangeEvent> {
        let current = i64::from(count);
        if current == self.last {
            return None;
        }

        let kind = if current > self.last {
            EventKind::NewMessage
        } else {
            EventKind::MessageRead
        };
        let event = ChangeEvent {
            kind,
            count: current,
            previous_count: Some(self.last),
            label: COUNT_EVENT_TITLE.to_string(),
            message: unread_message_text(count),
            timestamp,
        };
        self.last = current;
        Some(event)
    }
}

/// Tracks the last confident presence label. Returns to `available` are
/// remembered but never reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceDetector {
    last: Option<PresenceLabel>,
}

impl PresenceDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<PresenceLabel> {
        self.last
    }

    pub fn observe(&mut self, label: PresenceLabel, timestamp: i64) -> Option<ChangeEvent> {
        if !label.is_confident() || self.last == Some(label) {
            return None;
        }
        self.last = Some(label);

        if label == PresenceLabel::Available {
            return None;
        }
        Some(ChangeEvent {
            kind: EventKind::StatusAway,
            count: 0,
            previous_count: None,
            label: PRESENCE_EVENT_TITLE.to_string(),
            message: presence_message_text(label),
            timestamp,
        })
    }
}
