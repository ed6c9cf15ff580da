//! Event type lookup table.
//!
//! # Responsibility
//! - Define the closed set of postal occurrence kinds.
//! - Provide static display metadata and the forward transition per kind.
//!
//! # Invariants
//! - `from_raw` is total: unknown raw values map to `EventType::NoEvent`.
//! - Only `Written -> Sent`, `Inbound -> Received` and `Received -> Written`
//!   are transition edges. `Sent` and `NoEvent` have no next type.
//! - Transitions are advisory. Storage accepts any type for any pen-pal.

use serde::{Deserialize, Serialize};

/// Kind of postal occurrence recorded on a pen-pal timeline.
///
/// Raw values are persisted, so they must never be renumbered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// The user wrote a letter that is not posted yet.
    Written,
    /// The user received a letter from the pen-pal.
    Received,
    /// The pen-pal posted a letter that has not arrived yet.
    Inbound,
    /// The user posted their letter.
    Sent,
    /// Sentinel for pen-pals without any counted event.
    #[default]
    NoEvent,
}

impl EventType {
    /// Display order used by grouped list sections.
    pub const ALL: [EventType; 5] = [
        EventType::Written,
        EventType::Received,
        EventType::Inbound,
        EventType::Sent,
        EventType::NoEvent,
    ];

    /// Kinds a user can log directly from a pen-pal screen.
    pub const ACTIONABLE: [EventType; 4] = [
        EventType::Written,
        EventType::Sent,
        EventType::Inbound,
        EventType::Received,
    ];

    /// Kinds counted as the user's own actions.
    pub const OUTBOUND: [EventType; 2] = [EventType::Sent, EventType::Written];

    /// Kinds counted as arrivals from the pen-pal.
    pub const INBOUND: [EventType; 1] = [EventType::Received];

    /// Maps a persisted raw value to a kind. Never fails.
    pub fn from_raw(value: i64) -> Self {
        match value {
            1 => Self::Written,
            2 => Self::Received,
            3 => Self::Inbound,
            4 => Self::Sent,
            _ => Self::NoEvent,
        }
    }

    /// Raw value persisted in `events.type_value` and `penpals.last_event_type`.
    pub fn raw_value(self) -> i64 {
        match self {
            Self::Written => 1,
            Self::Received => 2,
            Self::Inbound => 3,
            Self::Sent => 4,
            Self::NoEvent => 99,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NoEvent => "Nothing yet",
            Self::Written => "Written",
            Self::Sent => "Sent",
            Self::Inbound => "Inbound",
            Self::Received => "Received",
        }
    }

    /// Symbol name rendered by the host UI.
    pub fn icon(self) -> &'static str {
        match self {
            Self::NoEvent => "hourglass",
            Self::Written => "envelope",
            Self::Sent => "paperplane",
            Self::Inbound => "square.and.arrow.down",
            Self::Received => "pencil.line",
        }
    }

    /// Section heading for pen-pals whose last event is this kind.
    pub fn phrase(self) -> &'static str {
        match self {
            Self::NoEvent => "Get started!",
            Self::Written => "You have letters to post!",
            Self::Sent => "Waiting for a response...",
            Self::Inbound => "Post is on its way!",
            Self::Received => "You have letters to reply to!",
        }
    }

    /// Prefix placed before a relative date, e.g. "You wrote to them 3 days ago".
    pub fn date_prefix(self) -> &'static str {
        match self {
            Self::NoEvent => "N/A",
            Self::Written => "You wrote to them",
            Self::Sent => "You posted their letter",
            Self::Inbound => "They posted their letter",
            Self::Received => "You received their letter",
        }
    }

    /// Single forward transition used to pre-fill the "advance" action.
    pub fn next_type(self) -> Option<EventType> {
        match self {
            Self::NoEvent => None,
            Self::Written => Some(Self::Sent),
            Self::Sent => None,
            Self::Inbound => Some(Self::Received),
            Self::Received => Some(Self::Written),
        }
    }

    /// Button text for the `next_type` action. Empty when there is none.
    pub fn next_type_button_text(self) -> &'static str {
        match self {
            Self::NoEvent => "",
            Self::Written => "I've posted it!",
            Self::Sent => "",
            Self::Inbound => "I've received it!",
            Self::Received => "I've written back!",
        }
    }

    /// Label for logging a new event of this kind.
    pub fn action_label(self) -> &'static str {
        match self {
            Self::NoEvent => "",
            Self::Written => "Log letter written",
            Self::Sent => "Log letter sent",
            Self::Inbound => "Log inbound post",
            Self::Received => "Log letter received",
        }
    }

    /// Returns whether this kind is the user's own action.
    pub fn is_outbound(self) -> bool {
        matches!(self, Self::Written | Self::Sent)
    }
}

/// Which side of the correspondence a set of events belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Events the user performed: `Sent` and `Written`.
    Outbound,
    /// Letters that arrived: `Received`.
    Inbound,
}

impl Direction {
    pub fn from_outbound(outbound: bool) -> Self {
        if outbound {
            Self::Outbound
        } else {
            Self::Inbound
        }
    }

    pub fn event_types(self) -> &'static [EventType] {
        match self {
            Self::Outbound => &EventType::OUTBOUND,
            Self::Inbound => &EventType::INBOUND,
        }
    }
}

impl From<i64> for EventType {
    fn from(value: i64) -> Self {
        Self::from_raw(value)
    }
}
