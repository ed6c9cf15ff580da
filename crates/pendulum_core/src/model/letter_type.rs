//! Mail item kind attached to each event.

use serde::{Deserialize, Serialize};

/// Kind of mail item an event refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterType {
    #[default]
    Letter,
    Postcard,
    Package,
    Newsletter,
}

impl LetterType {
    pub const ALL: [LetterType; 4] = [
        LetterType::Letter,
        LetterType::Postcard,
        LetterType::Package,
        LetterType::Newsletter,
    ];

    /// Maps a persisted raw value to a kind; unknown values fall back to
    /// `Letter`.
    pub fn from_raw(value: i64) -> Self {
        match value {
            1 => Self::Postcard,
            2 => Self::Package,
            3 => Self::Newsletter,
            _ => Self::Letter,
        }
    }

    pub fn raw_value(self) -> i64 {
        match self {
            Self::Letter => 0,
            Self::Postcard => 1,
            Self::Package => 2,
            Self::Newsletter => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Letter => "Letter",
            Self::Postcard => "Postcard",
            Self::Package => "Package",
            Self::Newsletter => "Newsletter",
        }
    }
}
